//! Interquartile-range Outlier Detection

/// Quantile of sorted values with linear interpolation between ranks
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Acceptance interval `[Q1 - k·IQR, Q3 + k·IQR]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrBounds {
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    /// Fit bounds on a column; `None` for an empty column
    pub fn fit(values: &[f64], k: f64) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let q1 = quantile(&sorted, 0.25)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            lower: q1 - k * iqr,
            upper: q3 + k * iqr,
        })
    }

    /// Whether a value lies inside the bounds
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Rows to keep: `false` where any column holds an outlier
pub fn iqr_keep_mask(columns: &[Vec<f64>], k: f64) -> Vec<bool> {
    let rows = columns.first().map_or(0, Vec::len);
    let mut keep = vec![true; rows];
    for column in columns {
        let Some(bounds) = IqrBounds::fit(column, k) else {
            continue;
        };
        for (flag, &v) in keep.iter_mut().zip(column) {
            if !bounds.contains(v) {
                *flag = false;
            }
        }
    }
    keep
}
