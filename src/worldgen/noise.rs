//! Seeded 2D gradient noise
//!
//! Classic Perlin-style value interpolation over hashed lattice gradients.
//! Every sample is a pure function of `(seed, x, y)` so map generation is
//! reproducible across platforms without caching lattice state.

/// Samples fractal noise at `(x, y)`: `octaves` layers of gradient noise
/// summed with amplitude decaying by `persistence` and frequency growing
/// by `lacunarity`. Output is unnormalized; callers rescale per-map.
pub fn fractal(seed: u64, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    for octave in 0..octaves {
        // Distinct gradient field per octave, so layers do not align.
        let layer_seed = seed.wrapping_add(u64::from(octave).wrapping_mul(0x9e37_79b9_7f4a_7c15));
        total += gradient(layer_seed, x * frequency, y * frequency) * amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }
    total
}

/// Single-octave gradient noise in roughly [-1, 1]
pub fn gradient(seed: u64, x: f64, y: f64) -> f64 {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let u = fade(fx);
    let v = fade(fy);

    let d00 = dot_corner(seed, x0, y0, fx, fy);
    let d10 = dot_corner(seed, x0 + 1, y0, fx - 1.0, fy);
    let d01 = dot_corner(seed, x0, y0 + 1, fx, fy - 1.0);
    let d11 = dot_corner(seed, x0 + 1, y0 + 1, fx - 1.0, fy - 1.0);

    lerp(lerp(d00, d10, u), lerp(d01, d11, u), v)
}

fn dot_corner(seed: u64, cx: i64, cy: i64, dx: f64, dy: f64) -> f64 {
    let (gx, gy) = corner_gradient(seed, cx, cy);
    gx * dx + gy * dy
}

/// Unit gradient vector for a lattice corner, one of eight directions
fn corner_gradient(seed: u64, cx: i64, cy: i64) -> (f64, f64) {
    const DIAG: f64 = std::f64::consts::FRAC_1_SQRT_2;
    match hash(seed, cx, cy) & 7 {
        0 => (1.0, 0.0),
        1 => (-1.0, 0.0),
        2 => (0.0, 1.0),
        3 => (0.0, -1.0),
        4 => (DIAG, DIAG),
        5 => (-DIAG, DIAG),
        6 => (DIAG, -DIAG),
        _ => (-DIAG, -DIAG),
    }
}

/// SplitMix64-style avalanche over the corner coordinates
fn hash(seed: u64, cx: i64, cy: i64) -> u64 {
    let mut h = seed
        ^ (cx as u64).wrapping_mul(0xff51_afd7_ed55_8ccd)
        ^ (cy as u64).wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^ (h >> 33)
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}
