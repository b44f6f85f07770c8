//! Cyclic (sine/cosine) Encoding

use std::f64::consts::PI;

/// Encode a periodic value as `(sin(2π·v/p), cos(2π·v/p))`.
///
/// Values one period apart encode identically, so hour 23 and hour 0 end up
/// close together instead of 23 units apart.
pub fn encode_cyclic(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}

/// A record field that is encoded cyclically
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CyclicField {
    /// Canonical record field name
    pub field: &'static str,
    /// Column prefix (`<prefix>_sin`, `<prefix>_cos`)
    pub prefix: &'static str,
    /// Period of the cycle
    pub period: f64,
}

impl CyclicField {
    /// Name of the sine column
    pub fn sin_column(&self) -> String {
        format!("{}_sin", self.prefix)
    }

    /// Name of the cosine column
    pub fn cos_column(&self) -> String {
        format!("{}_cos", self.prefix)
    }
}

/// Temporal fields and their periods
pub const CYCLIC_FIELDS: [CyclicField; 4] = [
    CyclicField { field: "hour", prefix: "hr", period: 24.0 },
    CyclicField { field: "month", prefix: "mnth", period: 12.0 },
    CyclicField { field: "weekday", prefix: "weekday", period: 7.0 },
    CyclicField { field: "day-of-month", prefix: "day", period: 31.0 },
];

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hour_zero() {
        let (s, c) = encode_cyclic(0.0, 24.0);
        assert!(s.abs() < 1e-12);
        assert!((c - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_quarter_period() {
        let (s, c) = encode_cyclic(6.0, 24.0);
        assert!((s - 1.0).abs() < 1e-12);
        assert!(c.abs() < 1e-12);
    }

    #[test]
    fn test_wraparound_is_close() {
        let a = encode_cyclic(23.0, 24.0);
        let b = encode_cyclic(0.0, 24.0);
        let c = encode_cyclic(12.0, 24.0);
        let dist = |x: (f64, f64), y: (f64, f64)| ((x.0 - y.0).powi(2) + (x.1 - y.1).powi(2)).sqrt();
        assert!(dist(a, b) < dist(b, c));
    }

    #[test]
    fn test_column_names() {
        let hour = CYCLIC_FIELDS[0];
        assert_eq!(hour.sin_column(), "hr_sin");
        assert_eq!(hour.cos_column(), "hr_cos");
    }

    proptest! {
        #[test]
        fn prop_unit_circle(value in -1.0e4f64..1.0e4, period in 0.5f64..1.0e3) {
            let (s, c) = encode_cyclic(value, period);
            prop_assert!((s * s + c * c - 1.0).abs() < 1e-9);
        }

        #[test]
        fn prop_periodic(value in -1.0e3f64..1.0e3, period in 1.0f64..100.0) {
            let (s1, c1) = encode_cyclic(value, period);
            let (s2, c2) = encode_cyclic(value + period, period);
            prop_assert!((s1 - s2).abs() < 1e-9);
            prop_assert!((c1 - c2).abs() < 1e-9);
        }
    }
}
