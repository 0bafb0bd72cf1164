//! Level normalization and the idle fallback waveform

use crate::constants::smoothing::IDLE_SPAN;

/// Scale a raw band average by `gain` and clamp to [0, 1].
///
/// Raw spectrum bins carry very little mass each, so `gain` is a fixed
/// amplification rather than anything derived from signal energy.
pub fn normalize(raw_level: f32, gain: f32) -> f32 {
    let scaled = raw_level * gain;
    if scaled.is_nan() {
        return 0.0;
    }
    scaled.clamp(0.0, 1.0)
}

/// Activity level used when there is no live input.
///
/// Two slow sine waves are multiplied and mapped onto
/// `[idle_floor, idle_floor + 0.2]`.
pub fn idle_level(time: f32, base_phase: f32, idle_floor: f32) -> f32 {
    let primary = (time * 0.5 + base_phase).sin() * 0.5 + 0.5;
    let secondary = (time * 0.3 + base_phase * 2.0).sin() * 0.3 + 0.3;

    lerp(idle_floor, idle_floor + IDLE_SPAN, primary * secondary)
}

/// Linear interpolation from `a` to `b` by `t` clamped to [0, 1]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_scales_and_clamps() {
        assert!((normalize(0.004, 100.0) - 0.4).abs() < 1e-6);
        assert_eq!(normalize(0.5, 100.0), 1.0);
        assert_eq!(normalize(-0.5, 100.0), 0.0);
        assert_eq!(normalize(0.0, 100.0), 0.0);
    }

    #[test]
    fn test_normalize_is_bounded_for_extreme_inputs() {
        let inputs = [
            f32::MIN,
            -1e30,
            -1.0,
            -1e-9,
            0.0,
            1e-9,
            0.01,
            1.0,
            1e30,
            f32::MAX,
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::NAN,
        ];
        for x in inputs {
            let once = normalize(x, 100.0);
            assert!((0.0..=1.0).contains(&once), "normalize({x}) = {once}");
            let twice = normalize(once / 100.0, 100.0);
            assert!((0.0..=1.0).contains(&twice), "re-normalize({x}) = {twice}");
        }
    }

    #[test]
    fn test_idle_level_stays_in_band() {
        let floor = 0.1;
        for step in 0..2000 {
            let t = step as f32 * 0.05;
            for phase in [0.3, 0.5, 0.7] {
                let level = idle_level(t, phase, floor);
                assert!(level >= floor - 1e-6, "t={t} phase={phase} level={level}");
                assert!(level <= floor + 0.2 + 1e-6, "t={t} phase={phase} level={level}");
            }
        }
    }

    #[test]
    fn test_idle_level_matches_formula() {
        let t = 3.0f32;
        let phase = 0.5f32;
        let primary = (t * 0.5 + phase).sin() * 0.5 + 0.5;
        let secondary = (t * 0.3 + phase * 2.0).sin() * 0.3 + 0.3;
        let expected = 0.1 + 0.2 * primary * secondary;
        assert!((idle_level(t, phase, 0.1) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_idle_level_varies_over_time() {
        let a = idle_level(0.0, 0.5, 0.1);
        let b = idle_level(5.0, 0.5, 0.1);
        assert!((a - b).abs() > 1e-4);
    }

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp(1.0, 3.0, 0.0), 1.0);
        assert_eq!(lerp(1.0, 3.0, 1.0), 3.0);
        assert_eq!(lerp(1.0, 3.0, 0.5), 2.0);
        assert_eq!(lerp(1.0, 3.0, 2.0), 3.0);
    }
}
