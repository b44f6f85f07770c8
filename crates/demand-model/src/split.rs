//! Train/Test Splitting

use crate::dataset::Dataset;
use crate::ModelError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

/// Shuffle rows with `seed` and hold out `ceil(n · test_size)` of them.
///
/// Returns `(train, test)`.
pub fn train_test_split(
    data: &Dataset,
    test_size: f64,
    seed: u64,
) -> Result<(Dataset, Dataset), ModelError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ModelError::InvalidParameter(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }
    let n = data.len();
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ModelError::InvalidParameter(format!(
            "cannot split {n} rows with test_size {test_size}"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let (test_idx, train_idx) = order.split_at(n_test);
    debug!("Split {} rows into {} train / {} test", n, train_idx.len(), test_idx.len());

    Ok((data.subset(train_idx), data.subset(test_idx)))
}
