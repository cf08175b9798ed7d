// ==============================================================================
// curve.rs — TURN RESPONSE CURVE
// ------------------------------------------------------------------------------
// Piecewise-linear map [0,1] -> [0,1] over |velocity ratio|. Designers use it
// to shape low-speed understeer: a car barely rolling should not pivot in
// place, a car at speed gets full steer authority.
//
// - keys are (time, value) pairs, sorted by time, both in [0,1]
// - values never decrease from one key to the next
// - input is clamped to [0,1]; outside the first/last key the curve is flat
// ==============================================================================

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseCurve {
    keys: Vec<CurveKey>,
}

impl ResponseCurve {
    pub fn new(keys: Vec<CurveKey>) -> Self {
        Self { keys }
    }

    pub fn from_pairs(pairs: &[(f32, f32)]) -> Self {
        Self::new(pairs.iter().map(|&(time, value)| CurveKey { time, value }).collect())
    }

    /// Identity ramp, full authority proportional to speed.
    pub fn linear() -> Self {
        Self::from_pairs(&[(0.0, 0.0), (1.0, 1.0)])
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keys.is_empty() {
            return Err(ConfigError::EmptyCurve);
        }

        for (index, k) in self.keys.iter().enumerate() {
            let in_range = |x: f32| x.is_finite() && (0.0..=1.0).contains(&x);
            if !in_range(k.time) || !in_range(k.value) {
                return Err(ConfigError::CurveKeyOutOfRange {
                    index,
                    time: k.time,
                    value: k.value,
                });
            }
        }

        for (i, pair) in self.keys.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            if b.time <= a.time || b.value < a.value {
                return Err(ConfigError::CurveNotMonotonic { index: i + 1 });
            }
        }

        Ok(())
    }

    /// Evaluate at `t` (clamped to [0,1]). Assumes `validate()` passed.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };

        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.time {
                let span = b.time - a.time;
                let u = (t - a.time) / span;
                return a.value + (b.value - a.value) * u;
            }
        }

        last.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_between_keys() {
        let c = ResponseCurve::from_pairs(&[(0.0, 0.0), (0.5, 1.0), (1.0, 1.0)]);
        assert!((c.evaluate(0.25) - 0.5).abs() < 1e-6);
        assert!((c.evaluate(0.75) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn clamps_input_and_extrapolates_flat() {
        let c = ResponseCurve::from_pairs(&[(0.2, 0.3), (0.8, 0.9)]);
        assert_eq!(c.evaluate(-4.0), 0.3);
        assert_eq!(c.evaluate(0.1), 0.3);
        assert_eq!(c.evaluate(7.0), 0.9);
        assert_eq!(c.evaluate(f32::NAN), 0.3);
    }

    #[test]
    fn rejects_decreasing_values() {
        let c = ResponseCurve::from_pairs(&[(0.0, 0.5), (0.5, 0.4)]);
        assert!(matches!(c.validate(), Err(ConfigError::CurveNotMonotonic { index: 1 })));
    }

    #[test]
    fn rejects_unsorted_or_out_of_range_keys() {
        let unsorted = ResponseCurve::from_pairs(&[(0.5, 0.1), (0.2, 0.2)]);
        assert!(unsorted.validate().is_err());

        let outside = ResponseCurve::from_pairs(&[(0.0, 0.0), (1.0, 1.5)]);
        assert!(matches!(outside.validate(), Err(ConfigError::CurveKeyOutOfRange { index: 1, .. })));

        assert!(matches!(ResponseCurve::new(vec![]).validate(), Err(ConfigError::EmptyCurve)));
    }
}
