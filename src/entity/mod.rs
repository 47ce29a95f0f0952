pub mod city;
pub mod civ;
pub mod unit;
