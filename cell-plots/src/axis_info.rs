use std::ops::Range;
use std::sync::Arc;

/// Fraction of the data span added on each side, matplotlib's default margin.
const MARGIN: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct AxisInfo {
    pub title: Arc<str>,
    pub lower: f64,
    pub upper: f64,
}

impl Default for AxisInfo {
    fn default() -> Self {
        Self {
            title: Arc::from(""),
            lower: 0_f64,
            upper: 1_f64,
        }
    }
}

impl AxisInfo {
    /// Limits covering every finite value (and `include`, when finite),
    /// padded by the default margin.
    pub fn from_values(title: &str, values: &[f64], include: Option<f64>) -> Self {
        let (lo, hi) = values
            .iter()
            .copied()
            .chain(include)
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        let (lower, upper) = if lo > hi {
            let default = Self::default();
            (default.lower, default.upper)
        } else if lo == hi {
            (lo - 0.5, hi + 0.5)
        } else {
            let pad = (hi - lo) * MARGIN;
            (lo - pad, hi + pad)
        };

        Self {
            title: Arc::from(title),
            lower,
            upper,
        }
    }

    pub fn range(&self) -> Range<f64> {
        self.lower..self.upper
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_the_data_extent() {
        let axis = AxisInfo::from_values("UMAP 1", &[0.0, 10.0, 5.0], None);
        assert_eq!(axis.lower, -0.5);
        assert_eq!(axis.upper, 10.5);
        assert_eq!(&*axis.title, "UMAP 1");
    }

    #[test]
    fn includes_the_threshold() {
        let axis = AxisInfo::from_values("Gene 1 Expression", &[1.0, 2.0], Some(6.0));
        assert!(axis.contains(6.0));
        assert!(axis.lower < 1.0);
    }

    #[test]
    fn ignores_non_finite_values() {
        let axis = AxisInfo::from_values("g", &[f64::NAN, 1.0, 3.0], Some(f64::INFINITY));
        assert!((axis.lower - 0.9).abs() < 1e-12);
        assert!((axis.upper - 3.1).abs() < 1e-12);
    }

    #[test]
    fn degenerate_extents() {
        let empty = AxisInfo::from_values("x", &[], None);
        assert_eq!(empty.range(), 0.0..1.0);

        let single = AxisInfo::from_values("x", &[4.0], None);
        assert_eq!(single.range(), 3.5..4.5);
    }
}
