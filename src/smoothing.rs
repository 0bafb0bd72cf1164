//! Exponential smoothing of activity levels

use crate::constants::smoothing::{IDLE_FLOOR, MAX_LEVEL};
use crate::error::PipelineError;

/// One EMA step: move `previous` toward `target` by `coefficient`.
///
/// `coefficient` must lie in (0, 1]; 1 jumps straight to the target.
pub fn step(previous: f32, target: f32, coefficient: f32) -> Result<f32, PipelineError> {
    if !(coefficient > 0.0 && coefficient <= 1.0) {
        return Err(PipelineError::InvalidCoefficient(coefficient));
    }
    Ok(previous + coefficient * (target - previous))
}

/// Smoothed state for a single channel, held inside `[idle_floor, max_level]`
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSmoother {
    value: f32,
    idle_floor: f32,
    max_level: f32,
}

impl LevelSmoother {
    /// Create a smoother resting at `idle_floor`
    pub fn new(idle_floor: f32, max_level: f32) -> Self {
        let idle_floor = if idle_floor.is_finite() { idle_floor } else { IDLE_FLOOR };
        let max_level = if max_level.is_finite() { max_level } else { MAX_LEVEL };
        let max_level = max_level.max(idle_floor);

        Self {
            value: idle_floor,
            idle_floor,
            max_level,
        }
    }

    /// Blend `target` into the state, clamp, store and return the new level
    pub fn update(&mut self, target: f32, coefficient: f32) -> Result<f32, PipelineError> {
        let blended = step(self.value, target, coefficient)?;
        // NaN targets leave the state where it was
        if !blended.is_nan() {
            self.value = blended.clamp(self.idle_floor, self.max_level);
        }
        Ok(self.value)
    }

    /// Drop back to the idle floor
    pub fn reset(&mut self) {
        self.value = self.idle_floor;
    }

    /// Get the current smoothed level
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn idle_floor(&self) -> f32 {
        self.idle_floor
    }

    pub fn max_level(&self) -> f32 {
        self.max_level
    }
}

impl Default for LevelSmoother {
    fn default() -> Self {
        Self::new(IDLE_FLOOR, MAX_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COEFFICIENTS: [f32; 6] = [1e-4, 0.05, 0.15, 0.5, 0.99, 1.0];

    #[test]
    fn test_step_toward_self_is_fixed_point() {
        for c in COEFFICIENTS {
            for s in [-3.0, 0.0, 0.1, 0.42, 1.0, 250.0] {
                assert_eq!(step(s, s, c).unwrap(), s, "c={c} s={s}");
            }
        }
    }

    #[test]
    fn test_step_is_linear_interpolation() {
        assert!((step(0.0, 1.0, 0.25).unwrap() - 0.25).abs() < 1e-6);
        assert!((step(1.0, 0.0, 0.25).unwrap() - 0.75).abs() < 1e-6);
        assert_eq!(step(0.3, 0.9, 1.0).unwrap(), 0.9);
    }

    #[test]
    fn test_step_rejects_out_of_range_coefficient() {
        for c in [0.0, -0.1, 1.0001, 2.0, f32::NAN, f32::INFINITY] {
            let result = step(0.0, 1.0, c);
            assert!(
                matches!(result, Err(PipelineError::InvalidCoefficient(_))),
                "c={c} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_step_error_shrinks_geometrically() {
        let c = 0.2f32;
        let s0 = 0.1f32;
        let target = 0.9f32;
        let mut state = s0;
        for n in 1..=30 {
            state = step(state, target, c).unwrap();
            let expected = (1.0 - c).powi(n) * (s0 - target).abs();
            assert!(((state - target).abs() - expected).abs() < 1e-5, "n={n}");
        }
    }

    #[test]
    fn test_smoother_starts_at_idle_floor() {
        let smoother = LevelSmoother::new(0.1, 1.0);
        assert_eq!(smoother.value(), 0.1);
        assert_eq!(LevelSmoother::default().value(), IDLE_FLOOR);
    }

    #[test]
    fn test_smoother_converges_monotonically_to_clamped_target() {
        for target in [-5.0f32, 0.0, 0.1, 0.55, 1.0, 7.0] {
            let mut smoother = LevelSmoother::new(0.1, 1.0);
            let goal = target.clamp(0.1, 1.0);
            let mut last_error = (smoother.value() - goal).abs();
            for _ in 0..500 {
                let v = smoother.update(target, 0.15).unwrap();
                assert!((0.1..=1.0).contains(&v));
                let error = (v - goal).abs();
                assert!(error <= last_error + 1e-7, "target={target}");
                last_error = error;
            }
            assert!(last_error < 1e-4, "target={target} error={last_error}");
        }
    }

    #[test]
    fn test_smoother_never_drops_below_floor() {
        let mut smoother = LevelSmoother::new(0.1, 1.0);
        smoother.update(1.0, 1.0).unwrap();
        for _ in 0..200 {
            let v = smoother.update(0.0, 0.5).unwrap();
            assert!(v >= 0.1);
        }
        assert!((smoother.value() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_smoother_invalid_coefficient_keeps_state() {
        let mut smoother = LevelSmoother::new(0.1, 1.0);
        smoother.update(0.8, 0.5).unwrap();
        let before = smoother.value();
        assert!(smoother.update(0.0, 0.0).is_err());
        assert_eq!(smoother.value(), before);
    }

    #[test]
    fn test_smoother_reset() {
        let mut smoother = LevelSmoother::new(0.2, 0.9);
        smoother.update(0.9, 1.0).unwrap();
        assert_eq!(smoother.value(), 0.9);
        smoother.reset();
        assert_eq!(smoother.value(), 0.2);
    }

    #[test]
    fn test_smoother_orders_inverted_bounds() {
        let smoother = LevelSmoother::new(0.6, 0.2);
        assert!(smoother.max_level() >= smoother.idle_floor());
    }
}
