// src/core/mod.rs
pub mod context;
pub mod counts;
pub mod direction;
pub mod grid;
pub mod types;
