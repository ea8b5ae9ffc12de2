//! NaN-skipping reductions of SNR tensors.
//!
//! Undefined edge bins are skipped rather than propagated, so a lane only
//! averages to NaN when it holds no defined value at all.

use crate::kernel::ExecInvariantViolation;
use crate::stats::nanmean;
use ndarray::{Array1, Array2, ArrayBase, ArrayD, ArrayViewD, Axis, Data, Dimension, Ix1, Ix2};
use num_traits::Float;

/// Averaged SNR spectra, as drawn by SNR spectrum plots.
#[derive(Debug, Clone, PartialEq)]
pub struct SnrSpectrumSummary<T> {
    /// Grand average over every leading axis, `[freqs]`.
    pub grand: Array1<T>,
    /// Average over trials, `[channels x freqs]`. Rank 3 input only.
    pub by_trial: Option<Array2<T>>,
    /// Average over channels, `[trials x freqs]`. Rank 3 input only.
    pub by_channel: Option<Array2<T>>,
}

fn nanmean_axis<T: Float>(a: ArrayViewD<'_, T>, axis: Axis) -> ArrayD<T> {
    a.map_axis(axis, |lane| nanmean::<_, T>(lane.iter()).0)
}

fn into_rank<T, D: Dimension>(a: ArrayD<T>) -> Result<ndarray::Array<T, D>, ExecInvariantViolation> {
    a.into_dimensionality::<D>()
        .map_err(|_| ExecInvariantViolation::InvalidState {
            reason: "reduction produced an unexpected rank",
        })
}

fn require_rank<S, D>(
    arg: &'static str,
    a: &ArrayBase<S, D>,
    accepted: &[usize],
    expected: &'static str,
) -> Result<(), ExecInvariantViolation>
where
    S: Data,
    D: Dimension,
{
    if accepted.contains(&a.ndim()) {
        Ok(())
    } else {
        Err(ExecInvariantViolation::UnsupportedRank {
            arg,
            rank: a.ndim(),
            expected,
        })
    }
}

/// Grand-average SNR spectrum: the mean over every axis but the last.
///
/// Trials are averaged first, then channels.
///
/// ```
/// use ftag_rs::signal::grand_average;
/// use ndarray::array;
///
/// let snr = array![[f64::NAN, 1.0, 2.0, f64::NAN], [f64::NAN, 3.0, 6.0, f64::NAN]];
/// let grand = grand_average(&snr).unwrap();
/// assert!(grand[0].is_nan());
/// assert_eq!(grand[1], 2.0);
/// assert_eq!(grand[2], 4.0);
/// ```
pub fn grand_average<T, S, D>(snr: &ArrayBase<S, D>) -> Result<Array1<T>, ExecInvariantViolation>
where
    T: Float,
    S: Data<Elem = T>,
    D: Dimension,
{
    require_rank("snr", snr, &[1, 2, 3], "1, 2 or 3")?;
    let mut reduced = snr.view().into_dyn().to_owned();
    while reduced.ndim() > 1 {
        reduced = nanmean_axis(reduced.view(), Axis(0));
    }
    into_rank::<T, Ix1>(reduced)
}

/// Mean over trials of a `[trials x channels x freqs]` tensor.
pub fn trial_average<T, S, D>(snr: &ArrayBase<S, D>) -> Result<Array2<T>, ExecInvariantViolation>
where
    T: Float,
    S: Data<Elem = T>,
    D: Dimension,
{
    require_rank("snr", snr, &[3], "3")?;
    into_rank::<T, Ix2>(nanmean_axis(snr.view().into_dyn(), Axis(0)))
}

/// Mean over channels of a `[trials x channels x freqs]` tensor.
pub fn channel_average<T, S, D>(snr: &ArrayBase<S, D>) -> Result<Array2<T>, ExecInvariantViolation>
where
    T: Float,
    S: Data<Elem = T>,
    D: Dimension,
{
    require_rank("snr", snr, &[3], "3")?;
    into_rank::<T, Ix2>(nanmean_axis(snr.view().into_dyn(), Axis(1)))
}

/// Grand average plus, for rank 3 input, the per-trial and per-channel
/// averages.
pub fn snr_spectrum_summary<T, S, D>(
    snr: &ArrayBase<S, D>,
) -> Result<SnrSpectrumSummary<T>, ExecInvariantViolation>
where
    T: Float,
    S: Data<Elem = T>,
    D: Dimension,
{
    let grand = grand_average(snr)?;
    let (by_trial, by_channel) = if snr.ndim() == 3 {
        (Some(trial_average(snr)?), Some(channel_average(snr)?))
    } else {
        (None, None)
    };
    Ok(SnrSpectrumSummary {
        grand,
        by_trial,
        by_channel,
    })
}

/// Per-channel grand average of SNR values taken at one frequency.
///
/// - rank 1 `[channels]`: returned unchanged
/// - rank 2 `[trials x channels]`: mean over trials
/// - rank 3 `[trials x channels x k]`: mean over the last axis, then trials
pub fn topography_average<T, S, D>(
    snr_at_freq: &ArrayBase<S, D>,
) -> Result<Array1<T>, ExecInvariantViolation>
where
    T: Float,
    S: Data<Elem = T>,
    D: Dimension,
{
    require_rank("snr_at_freq", snr_at_freq, &[1, 2, 3], "1, 2 or 3")?;
    let view = snr_at_freq.view().into_dyn();
    let reduced = match view.ndim() {
        1 => view.to_owned(),
        2 => nanmean_axis(view, Axis(0)),
        _ => {
            let per_trial = nanmean_axis(view, Axis(2));
            nanmean_axis(per_trial.view(), Axis(0))
        }
    };
    into_rank::<T, Ix1>(reduced)
}

/// Largest defined value of a spectrum, `None` when every value is NaN.
pub fn peak_snr<T, S, D>(spectrum: &ArrayBase<S, D>) -> Option<T>
where
    T: Float,
    S: Data<Elem = T>,
    D: Dimension,
{
    spectrum
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            Some(best) if best >= v => Some(best),
            _ => Some(v),
        })
}
