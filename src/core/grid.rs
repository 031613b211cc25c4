// src/core/grid.rs
//! Flat-grid discretization of coordinates.

use crate::core::types::CellId;

/// Truncated grid tick of `coordinate` at `scale`.
///
/// A coordinate that already is a grid value (`k / scale`) maps back to `k`
/// even when `coordinate * scale` lands just below `k` in floating point.
fn ticks(coordinate: f64, scale: u32) -> i64 {
    let scale = f64::from(scale);
    let scaled = coordinate * scale;
    let nearest = scaled.round();
    if nearest / scale == coordinate {
        nearest as i64
    } else {
        scaled.trunc() as i64
    }
}

/// Truncates `coordinate` toward zero at `1 / scale` resolution.
///
/// `discretize(-1.239, 100) == -1.23`. `scale` must be positive.
pub fn discretize(coordinate: f64, scale: u32) -> f64 {
    ticks(coordinate, scale) as f64 / f64::from(scale)
}

/// Maps a coordinate pair to its grid cell.
pub fn cell_id(latitude: f64, longitude: f64, scale: u32) -> CellId {
    CellId {
        lat_ticks: ticks(latitude, scale),
        long_ticks: ticks(longitude, scale),
        scale,
    }
}
