//! Civforge - Turn-Based Strategy Simulation Engine

pub mod ai;
pub mod combat;
pub mod core;
pub mod data;
pub mod diplomacy;
pub mod entity;
pub mod path;
pub mod save;
pub mod sim;
pub mod tech;
pub mod world;
pub mod worldgen;
