//! Missing Value Imputation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How to fill missing numeric values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Arithmetic mean of present values
    Mean,
    /// Median of present values
    Median,
    /// Most frequent present value
    Mode,
    /// A fixed value
    Constant(f64),
}

/// Median of a slice (average of the two middle values for even lengths)
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Most frequent value; ties go to the smallest value
pub fn mode<T: Ord + Clone + std::hash::Hash>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut counts: HashMap<T, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then_with(|| vb.cmp(va)))
        .map(|(v, _)| v)
}

fn fill_value(present: &[f64], strategy: ImputeStrategy) -> Option<f64> {
    match strategy {
        ImputeStrategy::Mean if present.is_empty() => None,
        ImputeStrategy::Mean => Some(present.iter().sum::<f64>() / present.len() as f64),
        ImputeStrategy::Median => median(present),
        ImputeStrategy::Mode => {
            // compare on bit patterns; present values are finite
            mode(present.iter().map(|v| OrderedBits(*v))).map(|b| b.0)
        }
        ImputeStrategy::Constant(c) => Some(c),
    }
}

/// Fill missing entries in place and return how many were filled.
///
/// A column with no present values is left untouched unless the strategy is
/// [`ImputeStrategy::Constant`].
pub fn impute(values: &mut [Option<f64>], strategy: ImputeStrategy) -> usize {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let Some(fill) = fill_value(&present, strategy) else {
        return 0;
    };
    let mut filled = 0;
    for v in values.iter_mut().filter(|v| v.is_none()) {
        *v = Some(fill);
        filled += 1;
    }
    filled
}

#[derive(Debug, Clone, Copy)]
struct OrderedBits(f64);

impl PartialEq for OrderedBits {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0).is_eq()
    }
}

impl Eq for OrderedBits {}

impl PartialOrd for OrderedBits {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedBits {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::hash::Hash for OrderedBits {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}
