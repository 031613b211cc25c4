// File: src/preprocess.rs
//! Turns a day of raw fixes into a cleaned [`DaySequence`].

use crate::config::PreprocessConfig;
use crate::core::grid::cell_id;
use crate::core::types::{CellId, DaySequence, Fix, Step, Token};
use crate::error::{PredictionError, Result};

pub struct TrajectoryPreprocessor {
    config: PreprocessConfig,
}

impl TrajectoryPreprocessor {
    pub fn new(config: PreprocessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    pub fn label(&self, fix: &Fix) -> CellId {
        cell_id(fix.latitude, fix.longitude, self.config.grid_scale)
    }

    /// Discretizes, de-duplicates and optionally segments one day of fixes.
    ///
    /// Repetition and gap checks compare against the last *kept* fix. The
    /// result always ends with a single boundary.
    pub fn process(&self, fixes: &[Fix]) -> Result<DaySequence> {
        let threshold = i64::try_from(self.config.segment_threshold_ms).unwrap_or(i64::MAX);
        let mut tokens = Vec::with_capacity(fixes.len() + 1);
        let mut last_cell: Option<CellId> = None;
        let mut last_time: Option<i64> = None;

        for (position, fix) in fixes.iter().enumerate() {
            if !fix.latitude.is_finite() || !fix.longitude.is_finite() {
                return Err(PredictionError::malformed_fix(
                    position,
                    format!("non-finite coordinate ({}, {})", fix.latitude, fix.longitude),
                ));
            }
            let cell = self.label(fix);

            if self.config.ignore_repetitions
                && last_cell == Some(cell)
                && (!self.config.ignore_added_only || !fix.is_original)
            {
                continue;
            }

            if self.config.segment {
                if let Some(previous) = last_time {
                    if fix.timestamp.saturating_sub(previous) >= threshold {
                        tokens.push(Token::Boundary);
                    }
                }
                last_time = Some(fix.timestamp);
            }

            tokens.push(Token::Visit(Step {
                cell,
                direction: fix.direction,
            }));
            last_cell = Some(cell);
        }

        Ok(DaySequence::from_tokens(tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Direction;

    const HOUR: i64 = 3_600_000;

    fn preprocessor(config: PreprocessConfig) -> TrajectoryPreprocessor {
        TrajectoryPreprocessor::new(config).unwrap()
    }

    fn cells(day: &DaySequence) -> Vec<Option<String>> {
        day.tokens()
            .iter()
            .map(|t| t.cell().map(|c| c.to_string()))
            .collect()
    }

    #[test]
    fn drops_consecutive_repetitions() {
        let p = preprocessor(PreprocessConfig::default());
        let day = p
            .process(&[
                Fix::new(34.021, -118.281, 0),
                Fix::new(34.029, -118.289, 1),
                Fix::new(34.031, -118.281, 2),
                Fix::new(34.021, -118.281, 3),
            ])
            .unwrap();
        assert_eq!(
            cells(&day),
            vec![
                Some("LAT34.02LON-118.28".to_string()),
                Some("LAT34.03LON-118.28".to_string()),
                Some("LAT34.02LON-118.28".to_string()),
                None,
            ]
        );
    }

    #[test]
    fn keeps_repetitions_when_disabled() {
        let p = preprocessor(PreprocessConfig {
            ignore_repetitions: false,
            ..Default::default()
        });
        let day = p
            .process(&[Fix::new(1.0, 1.0, 0), Fix::new(1.001, 1.001, 1)])
            .unwrap();
        assert_eq!(day.len(), 3);
    }

    #[test]
    fn added_only_keeps_original_repeats() {
        let p = preprocessor(PreprocessConfig {
            ignore_added_only: true,
            ..Default::default()
        });
        let day = p
            .process(&[
                Fix::new(1.0, 1.0, 0),
                Fix::new(1.001, 1.0, 1).interpolated(),
                Fix::new(1.002, 1.0, 2),
                Fix::new(1.003, 1.0, 3).interpolated(),
            ])
            .unwrap();
        // original repeat kept, both interpolated repeats dropped
        assert_eq!(day.len(), 3);
    }

    #[test]
    fn added_only_has_no_effect_without_repetition_filter() {
        let p = preprocessor(PreprocessConfig {
            ignore_repetitions: false,
            ignore_added_only: true,
            ..Default::default()
        });
        let day = p
            .process(&[
                Fix::new(1.0, 1.0, 0),
                Fix::new(1.001, 1.0, 1).interpolated(),
            ])
            .unwrap();
        assert_eq!(day.len(), 3);
        assert_eq!(day.tokens()[0].cell(), day.tokens()[1].cell());
    }

    #[test]
    fn segments_on_long_gaps_between_kept_fixes() {
        let p = preprocessor(PreprocessConfig {
            segment: true,
            ..Default::default()
        });
        let day = p
            .process(&[
                Fix::new(1.0, 1.0, 0),
                Fix::new(1.1, 1.0, HOUR - 1),
                // dropped repetition; its timestamp must not reset the gap
                Fix::new(1.1, 1.0, HOUR + 10),
                Fix::new(1.2, 1.0, 2 * HOUR - 1),
                Fix::new(1.3, 1.0, 2 * HOUR + 5),
            ])
            .unwrap();
        let boundaries: Vec<usize> = day
            .tokens()
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_boundary())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(boundaries, vec![2, 5]);
        assert_eq!(day.len(), 6);
    }

    #[test]
    fn carries_direction_through() {
        let p = preprocessor(PreprocessConfig::default());
        let day = p
            .process(&[Fix::new(1.0, 1.0, 0).heading(Direction::NE)])
            .unwrap();
        assert_eq!(day.tokens()[0].step().unwrap().direction, Some(Direction::NE));
        assert!(day.tokens()[1].is_boundary());
    }

    #[test]
    fn degenerate_days() {
        let p = preprocessor(PreprocessConfig::default());
        assert_eq!(p.process(&[]).unwrap().tokens(), &[Token::Boundary]);
        assert_eq!(p.process(&[Fix::new(1.0, 1.0, 0)]).unwrap().len(), 2);
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let p = preprocessor(PreprocessConfig::default());
        let err = p
            .process(&[Fix::new(1.0, 1.0, 0), Fix::new(f64::NAN, 1.0, 1)])
            .unwrap_err();
        assert!(matches!(err, PredictionError::MalformedFix { position: 1, .. }));
    }

    #[test]
    fn rejects_zero_scale() {
        let config = PreprocessConfig {
            grid_scale: 0,
            ..Default::default()
        };
        assert!(TrajectoryPreprocessor::new(config).is_err());
    }
}
