//! Scalar normalization and quantization helpers.

/// Linearly maps `raw` from the calibrated `[lo, hi]` interval into `[0, 1]`
/// and clamps.
///
/// `hi <= lo` marks a degenerate (uncalibrated) axis and always yields 0;
/// there is no division by zero and no out-of-range output. Raw values
/// outside the interval are clamped, not extrapolated: calibration sampling
/// commonly misses the true mechanical extremes.
pub fn normalize_u16(raw: u16, lo: u16, hi: u16) -> f32 {
    if hi <= lo {
        return 0.0;
    }
    let span = f32::from(hi - lo);
    ((f32::from(raw) - f32::from(lo)) / span).clamp(0.0, 1.0)
}

/// Quantizes a `[-1, 1]` value to an integer permille in `[-1000, 1000]`.
///
/// Truncates toward zero, matching the wire protocol's established rounding;
/// out-of-range inputs clamp.
pub fn to_permille(value: f32) -> i16 {
    let scaled = (value * 1000.0).trunc().clamp(-1000.0, 1000.0);
    scaled as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoints_exact() {
        assert!(normalize_u16(20000, 20000, 40000).abs() < f32::EPSILON);
        assert!((normalize_u16(40000, 20000, 40000) - 1.0).abs() < f32::EPSILON);
        assert!((normalize_u16(30000, 20000, 40000) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_clamps_outside_interval() {
        assert!(normalize_u16(0, 20000, 40000).abs() < f32::EPSILON);
        assert!((normalize_u16(65535, 20000, 40000) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_normalize_degenerate_axis_is_zero() {
        for raw in [0u16, 100, 40000, 65535] {
            assert!(normalize_u16(raw, 100, 100).abs() < f32::EPSILON);
            assert!(normalize_u16(raw, 40000, 20000).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_permille_exact_values() {
        assert_eq!(to_permille(-1.0), -1000);
        assert_eq!(to_permille(-0.5), -500);
        assert_eq!(to_permille(0.0), 0);
        assert_eq!(to_permille(0.5), 500);
        assert_eq!(to_permille(1.0), 1000);
    }

    #[test]
    fn test_permille_truncates_toward_zero() {
        assert_eq!(to_permille(0.9968), 996);
        assert_eq!(to_permille(-0.9968), -996);
        assert_eq!(to_permille(0.0009), 0);
        assert_eq!(to_permille(-0.0009), 0);
    }

    #[test]
    fn test_permille_clamps() {
        assert_eq!(to_permille(1.5), 1000);
        assert_eq!(to_permille(-7.0), -1000);
    }
}
