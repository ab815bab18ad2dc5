//! Stratified train/test splitting and k-fold partitioning.
//!
//! Both helpers work on sample indices and keep the class proportions of the
//! input in every partition. Randomness comes from a seeded [`StdRng`], so a
//! given seed always produces the same partition.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Result, SpamSiftError};
use crate::ml::Label;

/// Indices of one train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn indices_by_class(labels: &[Label]) -> [Vec<usize>; 2] {
    let mut by_class = [Vec::new(), Vec::new()];
    for (i, label) in labels.iter().enumerate() {
        by_class[label.as_index()].push(i);
    }
    by_class
}

/// Split sample indices into a stratified train/test partition.
///
/// The test set holds `ceil(test_size * n)` samples, shared between the
/// classes in proportion to their size (largest remainders get the extra
/// slots). Each class needs at least two samples so both sides see it.
pub fn stratified_train_test_split(labels: &[Label], test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(SpamSiftError::invalid_config(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }
    let n = labels.len();
    let mut by_class = indices_by_class(labels);
    if by_class.iter().any(|members| members.len() < 2) {
        return Err(SpamSiftError::corpus(
            "each class needs at least two samples for a stratified split",
        ));
    }

    let n_test = ((test_size * n as f64).ceil() as usize).clamp(2, n - 2);

    // Largest-remainder allocation of the test slots.
    let exact: Vec<f64> = by_class
        .iter()
        .map(|members| n_test as f64 * members.len() as f64 / n as f64)
        .collect();
    let mut allocation: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let mut remaining = n_test - allocation.iter().sum::<usize>();
    let mut order: Vec<usize> = (0..by_class.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for class in order {
        if remaining == 0 {
            break;
        }
        allocation[class] += 1;
        remaining -= 1;
    }
    for (class, members) in by_class.iter().enumerate() {
        allocation[class] = allocation[class].clamp(1, members.len() - 1);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = SplitIndices {
        train: Vec::with_capacity(n),
        test: Vec::with_capacity(n_test),
    };
    for (class, members) in by_class.iter_mut().enumerate() {
        members.shuffle(&mut rng);
        let (test, train) = members.split_at(allocation[class]);
        split.test.extend_from_slice(test);
        split.train.extend_from_slice(train);
    }
    split.train.sort_unstable();
    split.test.sort_unstable();
    Ok(split)
}

/// Partition sample indices into `k` stratified folds.
///
/// With `shuffle_seed == None` each class keeps its original order and is
/// cut into consecutive chunks; otherwise each class is shuffled first.
/// Returns one [`SplitIndices`] per fold whose `test` is that fold.
pub fn stratified_k_fold(labels: &[Label], k: usize, shuffle_seed: Option<u64>) -> Result<Vec<SplitIndices>> {
    if k < 2 {
        return Err(SpamSiftError::invalid_config(format!(
            "k-fold needs at least 2 folds, got {k}"
        )));
    }
    let mut by_class = indices_by_class(labels);
    if let Some(small) = by_class.iter().map(Vec::len).min()
        && small < k
    {
        return Err(SpamSiftError::training(format!(
            "each class needs at least {k} samples for {k}-fold splitting, smallest has {small}"
        )));
    }

    let mut rng = shuffle_seed.map(StdRng::seed_from_u64);
    let mut fold_of = vec![0usize; labels.len()];
    for members in by_class.iter_mut() {
        if let Some(rng) = rng.as_mut() {
            members.shuffle(rng);
        }
        let base = members.len() / k;
        let extra = members.len() % k;
        let mut start = 0;
        for fold in 0..k {
            let size = base + usize::from(fold < extra);
            for &idx in &members[start..start + size] {
                fold_of[idx] = fold;
            }
            start += size;
        }
    }

    Ok((0..k)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&i| fold_of[i] == fold);
            SplitIndices { train, test }
        })
        .collect())
}

/// Select the items at `indices`.
pub fn take<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}
