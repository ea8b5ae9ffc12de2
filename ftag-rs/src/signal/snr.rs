//! Signal-to-noise spectra from power spectral densities.
//!
//! Every frequency bin is divided by the mean power of its flanking bins.
//! For a bin `i`, `neighbor_count` bins on each side are averaged after
//! skipping the `skip_count` bins closest to `i`:
//!
//! ```text
//!   i-s-n .. i-s-1 | i-s .. i-1 | i | i+1 .. i+s | i+s+1 .. i+s+n
//!       noise      |   skipped  |   |  skipped   |     noise
//! ```
//!
//! Bins closer than `n + s` to either end of the spectrum have no complete
//! noise window and are reported as NaN.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D};
use crate::signal::layout::{canonicalize, check_freq_axis, restore};
use crate::signal::traits::SnrSpectrumNd;
use crate::stats::mean;
use log::{debug, warn};
use ndarray::{Array, Array3, ArrayBase, ArrayView3, Axis, Data, DataMut, Dimension};
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Constructor config for [`SnrSpectrumKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnrSpectrumConfig {
    /// Bins averaged on each side of the signal bin.
    pub neighbor_count: usize,
    /// Bins directly adjacent to the signal bin left out of the noise window.
    pub skip_count: usize,
}

impl Default for SnrSpectrumConfig {
    fn default() -> Self {
        Self {
            neighbor_count: 1,
            skip_count: 1,
        }
    }
}

/// Trait-first SNR spectrum kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnrSpectrumKernel {
    neighbor_count: usize,
    skip_count: usize,
}

impl SnrSpectrumKernel {
    /// Distance from either spectrum edge inside which bins are undefined.
    pub fn margin(&self) -> usize {
        self.neighbor_count + self.skip_count
    }

    /// Indices of the bins that receive a defined SNR for `n_freqs` bins.
    pub fn defined_bins(&self, n_freqs: usize) -> core::ops::Range<usize> {
        let margin = self.margin();
        margin..n_freqs.saturating_sub(margin)
    }

    fn compute<T, S, D>(&self, psd: &ArrayBase<S, D>) -> Result<Array<T, D>, ExecInvariantViolation>
    where
        T: Float,
        S: Data<Elem = T>,
        D: Dimension,
    {
        let (cube, layout) = canonicalize("psd", psd)?;
        let n_freqs = cube.len_of(Axis(2));
        if self.defined_bins(n_freqs).is_empty() {
            warn!(
                "spectrum of {n_freqs} bins is too short for a noise margin of {}; every bin is undefined",
                self.margin()
            );
        }
        debug!(
            "snr spectrum over shape {:?} (neighbors {}, skipped {})",
            psd.shape(),
            self.neighbor_count,
            self.skip_count
        );
        let snr = snr_cube(cube, self.neighbor_count, self.skip_count);
        restore(snr, layout)
    }
}

impl KernelLifecycle for SnrSpectrumKernel {
    type Config = SnrSpectrumConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config
            .neighbor_count
            .checked_add(config.skip_count)
            .and_then(|m| m.checked_mul(2))
            .is_none()
        {
            return Err(ConfigError::InvalidArgument {
                arg: "neighbor_count",
                reason: "noise window does not fit in the address space",
            });
        }
        Ok(Self {
            neighbor_count: config.neighbor_count,
            skip_count: config.skip_count,
        })
    }
}

impl<T> SnrSpectrumNd<T> for SnrSpectrumKernel
where
    T: Float,
{
    fn run_into<S, SO, D>(
        &self,
        psd: &ArrayBase<S, D>,
        out: &mut ArrayBase<SO, D>,
    ) -> Result<(), ExecInvariantViolation>
    where
        S: Data<Elem = T>,
        SO: DataMut<Elem = T>,
        D: Dimension,
    {
        if out.shape() != psd.shape() {
            return Err(ExecInvariantViolation::ShapeMismatch {
                arg: "out",
                expected: psd.shape().to_vec(),
                got: out.shape().to_vec(),
            });
        }
        let snr = self.compute(psd)?;
        out.assign(&snr);
        Ok(())
    }

    fn run_alloc<S, D>(&self, psd: &ArrayBase<S, D>) -> Result<Array<T, D>, ExecInvariantViolation>
    where
        S: Data<Elem = T>,
        D: Dimension,
    {
        self.compute(psd)
    }

    fn run_with_bins<S, D, I>(
        &self,
        psd: &ArrayBase<S, D>,
        freqs: &I,
    ) -> Result<Array<T, D>, ExecInvariantViolation>
    where
        S: Data<Elem = T>,
        D: Dimension,
        I: Read1D<f64> + ?Sized,
    {
        let freqs = freqs.read_nonempty("freqs")?;
        check_freq_axis("psd", psd, freqs.len())?;
        self.compute(psd)
    }
}

fn snr_cube<T>(psd: ArrayView3<'_, T>, neighbor_count: usize, skip_count: usize) -> Array3<T>
where
    T: Float,
{
    let margin = neighbor_count + skip_count;
    let n_freqs = psd.len_of(Axis(2));
    let mut snr = Array3::from_elem(psd.raw_dim(), T::nan());

    for (power, mut ratio) in psd.lanes(Axis(2)).into_iter().zip(snr.lanes_mut(Axis(2))) {
        for i in margin..n_freqs.saturating_sub(margin) {
            // Upper and lower neighbours interleaved, nearest first.
            let noise = (1..=neighbor_count)
                .flat_map(|k| [power[i + skip_count + k], power[i - skip_count - k]]);
            // An empty window has a NaN mean.
            ratio[i] = power[i] / mean::<_, T>(noise).0;
        }
    }
    snr
}

/// Compute the SNR spectrum of a `[channels x freqs]` or
/// `[trials x channels x freqs]` PSD tensor.
///
/// The output has the shape of `psd`. Bins within `neighbor_count +
/// skip_count` of either spectrum edge are NaN. A zero noise estimate is not
/// guarded and yields `inf` or NaN.
///
/// ```
/// use ftag_rs::signal::snr_spectrum;
/// use ndarray::array;
///
/// let psd = array![[1.0f64, 1.0, 4.0, 1.0, 1.0, 1.0, 1.0]];
/// let snr = snr_spectrum(&psd, 1, 1).unwrap();
///
/// assert_eq!(snr.shape(), psd.shape());
/// assert!(snr[[0, 0]].is_nan() && snr[[0, 6]].is_nan());
/// assert_eq!(snr[[0, 2]], 4.0);
/// ```
pub fn snr_spectrum<T, S, D>(
    psd: &ArrayBase<S, D>,
    neighbor_count: usize,
    skip_count: usize,
) -> Result<Array<T, D>, ExecInvariantViolation>
where
    T: Float,
    S: Data<Elem = T>,
    D: Dimension,
{
    let kernel = SnrSpectrumKernel::try_new(SnrSpectrumConfig {
        neighbor_count,
        skip_count,
    })?;
    kernel.run_alloc(psd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2, Array3, ArrayD, IxDyn};

    fn tagged_psd(n_freqs: usize) -> Array2<f64> {
        Array2::from_shape_fn((3, n_freqs), |(ch, k)| {
            let base = 1.0 / (1.0 + k as f64) + 0.01 * (ch + 1) as f64;
            if k == n_freqs / 2 {
                base * 10.0
            } else {
                base
            }
        })
    }

    #[test]
    fn output_shape_matches_input_shape() {
        let psd2 = tagged_psd(32);
        assert_eq!(snr_spectrum(&psd2, 2, 1).expect("rank 2").shape(), psd2.shape());

        let psd3 = Array3::from_elem((4, 3, 32), 2.0f32);
        assert_eq!(snr_spectrum(&psd3, 3, 0).expect("rank 3").shape(), psd3.shape());

        let dyn_psd = ArrayD::from_elem(IxDyn(&[2, 5, 20]), 1.0f64);
        assert_eq!(snr_spectrum(&dyn_psd, 1, 1).expect("dyn").shape(), &[2, 5, 20]);
    }

    #[test]
    fn seven_bin_example_defines_only_the_middle_bins() {
        let psd = Array2::from_shape_fn((2, 7), |(ch, k)| 1.0 + (ch * 7 + k) as f64);
        let snr = snr_spectrum(&psd, 1, 1).expect("snr");
        for ch in 0..2 {
            for k in [0, 1, 5, 6] {
                assert!(snr[[ch, k]].is_nan(), "bin {k} should be undefined");
            }
            for k in [2, 3, 4] {
                assert!(snr[[ch, k]].is_finite(), "bin {k} should be defined");
            }
        }
        // A linear ramp equals the mean of its symmetric neighbours.
        for k in [2, 3, 4] {
            assert_relative_eq!(snr[[1, k]], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn edges_are_undefined_for_every_slice() {
        let psd = Array3::from_shape_fn((3, 2, 40), |(t, c, k)| 1.0 + (t + c + k) as f64);
        let (n, s) = (3, 2);
        let snr = snr_spectrum(&psd, n, s).expect("snr");
        let margin = n + s;
        for ((_, _, k), v) in snr.indexed_iter() {
            if k < margin || k >= 40 - margin {
                assert!(v.is_nan());
            } else {
                assert!(v.is_finite());
            }
        }
    }

    #[test]
    fn constant_spectrum_has_unit_snr() {
        let psd = Array3::from_elem((2, 4, 50), 7.25f64);
        let snr = snr_spectrum(&psd, 4, 2).expect("snr");
        snr.iter()
            .filter(|v| !v.is_nan())
            .for_each(|v| assert_eq!(*v, 1.0));
        assert_eq!(snr.iter().filter(|v| !v.is_nan()).count(), 2 * 4 * (50 - 12));
    }

    #[test]
    fn inexact_constant_spectrum_has_unit_snr() {
        for v in [0.1f64, 0.3, 3.3e-11, 7.0 / 3.0] {
            let psd = Array2::from_elem((1, 40), v);
            for n in 1..=8 {
                let snr = snr_spectrum(&psd, n, 1).expect("snr");
                for k in (n + 1)..(40 - n - 1) {
                    assert_eq!(snr[[0, k]], 1.0, "v={v} n={n} bin {k}");
                }
            }
        }
    }

    #[test]
    fn rank_two_matches_singleton_rank_three() {
        let psd2 = tagged_psd(48);
        let psd3 = psd2.clone().insert_axis(Axis(0));
        let snr2 = snr_spectrum(&psd2, 3, 1).expect("rank 2");
        let snr3 = snr_spectrum(&psd3, 3, 1).expect("rank 3");
        let snr3 = snr3.index_axis(Axis(0), 0);
        for (a, b) in snr2.iter().zip(snr3.iter()) {
            assert!(a.is_nan() && b.is_nan() || a == b);
        }
    }

    #[test]
    fn tagged_bin_stands_out_from_noise() {
        let psd = tagged_psd(64);
        let snr = snr_spectrum(&psd, 3, 1).expect("snr");
        for ch in 0..3 {
            assert!(snr[[ch, 32]] > 5.0);
            assert!(snr[[ch, 20]] < 1.5);
        }
    }

    #[test]
    fn skip_excludes_adjacent_bins() {
        // Adjacent bins carry huge leakage that must not reach the noise mean.
        let psd = array![[1.0, 2.0, 100.0, 8.0, 100.0, 2.0, 1.0]];
        let snr = snr_spectrum(&psd, 1, 1).expect("snr");
        assert_relative_eq!(snr[[0, 3]], 8.0 / 2.0, epsilon = 1e-12);
        let leaky = snr_spectrum(&psd, 1, 0).expect("snr");
        assert_relative_eq!(leaky[[0, 3]], 8.0 / 100.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_noise_follows_ieee_division() {
        let psd = array![[0.0, 0.0, 3.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0, 0.0]];
        let snr = snr_spectrum(&psd, 1, 0).expect("snr");
        assert!(snr[[0, 2]].is_infinite());
        assert!(snr[[1, 2]].is_nan());
    }

    #[test]
    fn zero_neighbors_leave_every_bin_undefined() {
        let psd = tagged_psd(16);
        let snr = snr_spectrum(&psd, 0, 2).expect("snr");
        assert!(snr.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn short_spectrum_is_entirely_undefined() {
        let psd = Array2::from_elem((2, 4), 1.0f64);
        let snr = snr_spectrum(&psd, 2, 1).expect("snr");
        assert!(snr.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn unsupported_ranks_are_rejected() {
        let flat = ndarray::Array1::from_elem(16, 1.0f64);
        assert!(matches!(
            snr_spectrum(&flat, 1, 1),
            Err(ExecInvariantViolation::UnsupportedRank { rank: 1, .. })
        ));
        let deep = ArrayD::from_elem(IxDyn(&[1, 1, 2, 16]), 1.0f64);
        assert!(matches!(
            snr_spectrum(&deep, 1, 1),
            Err(ExecInvariantViolation::UnsupportedRank { rank: 4, .. })
        ));
    }

    #[test]
    fn run_with_bins_checks_frequency_axis() {
        let kernel = SnrSpectrumKernel::try_new(SnrSpectrumConfig::default()).expect("kernel");
        let psd = tagged_psd(10);
        let freqs: Vec<f64> = (0..9).map(|k| k as f64 * 0.5).collect();
        let err = kernel
            .run_with_bins(&psd, &freqs)
            .expect_err("bin count mismatch");
        assert_eq!(
            err,
            ExecInvariantViolation::AxisMismatch {
                arg: "psd",
                axis: 1,
                expected: 9,
                got: 10,
            }
        );

        let freqs: Vec<f64> = (0..10).map(|k| k as f64 * 0.5).collect();
        let snr = kernel.run_with_bins(&psd, &freqs).expect("matching bins");
        assert_eq!(snr.shape(), psd.shape());
    }

    #[test]
    fn run_into_validates_output_shape() {
        let kernel = SnrSpectrumKernel::try_new(SnrSpectrumConfig::default()).expect("kernel");
        let psd = tagged_psd(12);
        let mut out = Array2::<f64>::zeros((3, 11));
        let err = kernel
            .run_into(&psd, &mut out)
            .expect_err("mismatched output");
        assert!(matches!(err, ExecInvariantViolation::ShapeMismatch { arg: "out", .. }));

        let mut out = Array2::<f64>::zeros((3, 12));
        kernel.run_into(&psd, &mut out).expect("run_into");
        let expected = kernel.run_alloc(&psd).expect("run_alloc");
        for (a, b) in out.iter().zip(expected.iter()) {
            assert!(a.is_nan() && b.is_nan() || a == b);
        }
    }

    #[test]
    fn config_round_trips_through_json() {
        let config: SnrSpectrumConfig =
            serde_json::from_str(r#"{"neighbor_count": 3, "skip_count": 1}"#).expect("json");
        let kernel = SnrSpectrumKernel::try_new(config).expect("kernel");
        assert_eq!(kernel.margin(), 4);
        assert_eq!(kernel.defined_bins(10), 4..6);
        assert!(kernel.defined_bins(6).is_empty());
    }

    #[test]
    fn oversized_window_is_rejected() {
        assert!(SnrSpectrumKernel::try_new(SnrSpectrumConfig {
            neighbor_count: usize::MAX,
            skip_count: 1,
        })
        .is_err());
    }
}
