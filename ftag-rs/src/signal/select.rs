//! Nearest-bin selection of SNR values at a stimulation frequency.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D};
use crate::signal::layout::check_freq_axis;
use crate::signal::traits::FrequencySelectNd;
use crate::stats::nanmean;
use log::{debug, log_enabled, Level};
use ndarray::{ArrayBase, ArrayD, Axis, Data, Dimension};
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Constructor config for [`SnrAtFrequencyKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnrAtFrequencyConfig {
    /// Frequency of interest in Hz.
    pub target_freq: f64,
}

/// Trait-first frequency selection kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnrAtFrequencyKernel {
    target_freq: f64,
}

impl SnrAtFrequencyKernel {
    /// Frequency this kernel selects.
    pub fn target_freq(&self) -> f64 {
        self.target_freq
    }

    /// Index of the bin in `freqs` nearest to the target frequency.
    pub fn nearest_bin<I>(&self, freqs: &I) -> Result<usize, ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let freqs = freqs.read_nonempty("freqs")?;
        nearest_bin_impl(freqs, self.target_freq)
    }
}

impl KernelLifecycle for SnrAtFrequencyKernel {
    type Config = SnrAtFrequencyConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if !config.target_freq.is_finite() {
            return Err(ConfigError::InvalidArgument {
                arg: "target_freq",
                reason: "target_freq must be finite",
            });
        }
        Ok(Self {
            target_freq: config.target_freq,
        })
    }
}

impl<T> FrequencySelectNd<T> for SnrAtFrequencyKernel
where
    T: Float,
{
    fn run_alloc<S, D, I>(
        &self,
        snr: &ArrayBase<S, D>,
        freqs: &I,
    ) -> Result<ArrayD<T>, ExecInvariantViolation>
    where
        S: Data<Elem = T>,
        D: Dimension,
        I: Read1D<f64> + ?Sized,
    {
        let freqs = freqs.read_nonempty("freqs")?;
        let bin = nearest_bin_impl(freqs, self.target_freq)?;

        let snr = snr.view().into_dyn();
        let selected = match snr.ndim() {
            1 => snr.to_owned(),
            2 | 3 => {
                check_freq_axis("snr", &snr, freqs.len())?;
                let last = Axis(snr.ndim() - 1);
                snr.index_axis(last, bin).to_owned()
            }
            rank => {
                return Err(ExecInvariantViolation::UnsupportedRank {
                    arg: "snr",
                    rank,
                    expected: "1, 2 or 3",
                })
            }
        };

        if log_enabled!(Level::Debug) {
            let (average, n): (T, usize) = nanmean(selected.iter());
            debug!(
                "average SNR at {} Hz (bin {bin}, {:.3} Hz): {:.3} over {n} values",
                self.target_freq,
                freqs[bin],
                average.to_f64().unwrap_or(f64::NAN),
            );
        }
        Ok(selected)
    }
}

fn nearest_bin_impl(freqs: &[f64], target_freq: f64) -> Result<usize, ExecInvariantViolation> {
    let mut best: Option<(usize, f64)> = None;
    for (k, f) in freqs.iter().enumerate() {
        let distance = (f - target_freq).abs();
        if distance.is_nan() {
            continue;
        }
        // Strict comparison keeps the lowest index on ties.
        match best {
            Some((_, closest)) if distance >= closest => {}
            _ => best = Some((k, distance)),
        }
    }
    best.map(|(k, _)| k)
        .ok_or(ExecInvariantViolation::InvalidState {
            reason: "frequency axis has no comparable bins",
        })
}

/// Index of the bin in `freqs` nearest to `target_freq`.
///
/// Ties resolve to the lowest index. NaN bins never match.
///
/// ```
/// use ftag_rs::signal::nearest_bin;
///
/// assert_eq!(nearest_bin(&[1.0, 2.0, 3.0, 4.0, 5.0], 3.1).unwrap(), 2);
/// assert_eq!(nearest_bin(&[1.0, 2.0, 3.0, 4.0], 2.5).unwrap(), 1);
/// ```
pub fn nearest_bin(freqs: &[f64], target_freq: f64) -> Result<usize, ExecInvariantViolation> {
    SnrAtFrequencyKernel::try_new(SnrAtFrequencyConfig { target_freq })?.nearest_bin(freqs)
}

/// Select the SNR at the bin nearest to `target_freq`.
///
/// Rank 2 and 3 tensors lose their last (frequency) axis. A rank 1 tensor is
/// taken as already collapsed over frequency and returned unchanged.
///
/// ```
/// use ftag_rs::signal::snr_at_frequency;
/// use ndarray::array;
///
/// let freqs = [10.0, 11.0, 12.0, 13.0];
/// let snr = array![[0.9, 1.1, 6.0, 1.0], [1.0, 0.8, 4.0, 1.2]];
/// let at = snr_at_frequency(&snr, &freqs, 12.2).unwrap();
///
/// assert_eq!(at.shape(), &[2]);
/// assert_eq!(at.as_slice().unwrap(), &[6.0, 4.0]);
/// ```
pub fn snr_at_frequency<T, S, D>(
    snr: &ArrayBase<S, D>,
    freqs: &[f64],
    target_freq: f64,
) -> Result<ArrayD<T>, ExecInvariantViolation>
where
    T: Float,
    S: Data<Elem = T>,
    D: Dimension,
{
    let kernel = SnrAtFrequencyKernel::try_new(SnrAtFrequencyConfig { target_freq })?;
    kernel.run_alloc(snr, freqs)
}

/// Select the SNR at several target frequencies, one slice per target in
/// input order.
pub fn snr_at_frequencies<T, S, D>(
    snr: &ArrayBase<S, D>,
    freqs: &[f64],
    target_freqs: &[f64],
) -> Result<Vec<ArrayD<T>>, ExecInvariantViolation>
where
    T: Float,
    S: Data<Elem = T>,
    D: Dimension,
{
    target_freqs
        .iter()
        .map(|&target_freq| snr_at_frequency(snr, freqs, target_freq))
        .collect()
}
