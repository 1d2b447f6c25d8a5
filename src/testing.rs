//! Synthetic datasets for tests and examples.

use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Noiseless linear regression data: `y = slope * x` on an evenly spaced
/// single feature.
pub fn linear_ramp(n_samples: usize, slope: f64) -> (Array2<f64>, Array1<f64>) {
    let features =
        Array2::from_shape_fn((n_samples, 1), |(row, _)| row as f64);
    let targets = Array1::from_shape_fn(n_samples, |row| slope * row as f64);
    (features, targets)
}

/// Two well-separated 2-d Gaussian-ish blobs with labels 0 and 1.
///
/// Blob 0 is centered at the origin, blob 1 at `(separation, separation)`;
/// jitter is uniform in [-0.5, 0.5) per coordinate.
pub fn two_clusters(
    n_per_cluster: usize,
    separation: f64,
    seed: u64,
) -> (Array2<f64>, Array1<f64>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let n = 2 * n_per_cluster;
    let mut features = Array2::zeros((n, 2));
    let mut labels = Array1::zeros(n);

    for row in 0..n {
        let label = (row >= n_per_cluster) as usize;
        let center = label as f64 * separation;
        features[[row, 0]] = center + rng.gen::<f64>() - 0.5;
        features[[row, 1]] = center + rng.gen::<f64>() - 0.5;
        labels[row] = label as f64;
    }

    (features, labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_shape_and_values() {
        let (x, y) = linear_ramp(4, 2.0);
        assert_eq!(x.dim(), (4, 1));
        assert_eq!(y.to_vec(), vec![0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn clusters_are_labeled_and_separated() {
        let (x, y) = two_clusters(10, 10.0, 0);
        assert_eq!(x.dim(), (20, 2));
        assert_eq!(y.iter().filter(|&&l| l == 1.0).count(), 10);
        // Every cluster-1 point sits far from the origin.
        for row in 10..20 {
            assert!(x[[row, 0]] > 5.0);
        }
    }

    #[test]
    fn clusters_are_reproducible_per_seed() {
        let (x1, _) = two_clusters(5, 4.0, 9);
        let (x2, _) = two_clusters(5, 4.0, 9);
        assert_eq!(x1, x2);
    }
}
