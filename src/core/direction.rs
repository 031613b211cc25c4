// src/core/direction.rs
//! Heading classification for fixes that arrive without a direction label.

use crate::core::types::{Direction, Fix};

impl Direction {
    /// Compass heading from one `(latitude, longitude)` position to another,
    /// quantized into 45° sectors centred on north.
    pub fn between(from: (f64, f64), to: (f64, f64)) -> Direction {
        let d_lat = to.0 - from.0;
        let d_long = to.1 - from.1;
        if d_lat == 0.0 && d_long == 0.0 {
            return Direction::Stat;
        }
        let bearing = d_long.atan2(d_lat).to_degrees().rem_euclid(360.0);
        let sector = ((bearing + 22.5) / 45.0).floor() as usize % 8;
        Direction::ALL[sector]
    }
}

/// Labels every fix with the heading from its predecessor. The first fix has
/// no predecessor and is left unlabelled.
pub fn annotate_directions(fixes: &mut [Fix]) {
    let mut previous: Option<(f64, f64)> = None;
    for fix in fixes.iter_mut() {
        let here = (fix.latitude, fix.longitude);
        fix.direction = previous.map(|from| Direction::between(from, here));
        previous = Some(here);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinal_and_diagonal_headings() {
        let origin = (34.0, -118.0);
        assert_eq!(Direction::between(origin, (34.1, -118.0)), Direction::N);
        assert_eq!(Direction::between(origin, (34.1, -117.9)), Direction::NE);
        assert_eq!(Direction::between(origin, (34.0, -117.9)), Direction::E);
        assert_eq!(Direction::between(origin, (33.9, -117.9)), Direction::SE);
        assert_eq!(Direction::between(origin, (33.9, -118.0)), Direction::S);
        assert_eq!(Direction::between(origin, (33.9, -118.1)), Direction::SW);
        assert_eq!(Direction::between(origin, (34.0, -118.1)), Direction::W);
        assert_eq!(Direction::between(origin, (34.1, -118.1)), Direction::NW);
        assert_eq!(Direction::between(origin, origin), Direction::Stat);
    }

    #[test]
    fn annotation_leaves_first_fix_unlabelled() {
        let mut fixes = vec![
            Fix::new(1.0, 1.0, 0),
            Fix::new(1.5, 1.0, 1),
            Fix::new(1.5, 1.0, 2),
        ];
        annotate_directions(&mut fixes);
        assert_eq!(fixes[0].direction, None);
        assert_eq!(fixes[1].direction, Some(Direction::N));
        assert_eq!(fixes[2].direction, Some(Direction::Stat));
    }
}
