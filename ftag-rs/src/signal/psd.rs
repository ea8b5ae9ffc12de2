//! Decibel summaries of power spectral densities.

use crate::kernel::{ConfigError, ExecInvariantViolation, Read1D};
use crate::signal::layout::check_freq_axis;
use crate::stats::{mean, stdev};
use core::iter::Sum;
use ndarray::{Array1, ArrayBase, Axis, Data, Dimension};
use num_traits::Float;

/// Mean and spread of a PSD in decibels over a frequency band.
#[derive(Debug, Clone, PartialEq)]
pub struct PsdSummary<T> {
    /// Frequencies of the retained bins.
    pub freqs: Array1<f64>,
    /// Mean of `10 * log10(psd)` over every leading axis.
    pub mean_db: Array1<T>,
    /// Population standard deviation of `10 * log10(psd)` over every leading axis.
    pub std_db: Array1<T>,
}

/// Summarize `psd` in decibels between `fmin` and `fmax` (inclusive).
///
/// `psd` may be `[freqs]`, `[channels x freqs]` or
/// `[trials x channels x freqs]`. Missing band edges default to the lowest
/// and highest bin of `freqs`.
///
/// ```
/// use approx::assert_relative_eq;
/// use ftag_rs::signal::psd_db_summary;
/// use ndarray::array;
///
/// let freqs = [1.0, 2.0, 3.0];
/// let psd = array![[1.0, 10.0, 100.0], [1.0, 1000.0, 100.0]];
/// let summary = psd_db_summary(&psd, &freqs, Some(2.0), None).unwrap();
///
/// assert_eq!(summary.freqs.to_vec(), vec![2.0, 3.0]);
/// assert_relative_eq!(summary.mean_db[0], 20.0, epsilon = 1e-9);
/// assert_relative_eq!(summary.std_db[0], 10.0, epsilon = 1e-9);
/// assert_relative_eq!(summary.std_db[1], 0.0, epsilon = 1e-9);
/// ```
pub fn psd_db_summary<T, S, D, I>(
    psd: &ArrayBase<S, D>,
    freqs: &I,
    fmin: Option<f64>,
    fmax: Option<f64>,
) -> Result<PsdSummary<T>, ExecInvariantViolation>
where
    T: Float + Default + Sum,
    S: Data<Elem = T>,
    D: Dimension,
    I: Read1D<f64> + ?Sized,
{
    let freqs = freqs.read_nonempty("freqs")?;
    if !(1..=3).contains(&psd.ndim()) {
        return Err(ExecInvariantViolation::UnsupportedRank {
            arg: "psd",
            rank: psd.ndim(),
            expected: "1, 2 or 3",
        });
    }
    check_freq_axis("psd", psd, freqs.len())?;

    let defined = || freqs.iter().copied().filter(|f| !f.is_nan());
    if defined().next().is_none() {
        return Err(ExecInvariantViolation::InvalidState {
            reason: "frequency axis has no comparable bins",
        });
    }
    let fmin = fmin.unwrap_or_else(|| defined().fold(f64::INFINITY, f64::min));
    let fmax = fmax.unwrap_or_else(|| defined().fold(f64::NEG_INFINITY, f64::max));
    if fmin > fmax {
        return Err(ConfigError::InvalidArgument {
            arg: "fmin",
            reason: "fmin must not exceed fmax",
        }
        .into());
    }

    let bins: Vec<usize> = freqs
        .iter()
        .enumerate()
        .filter(|(_, f)| **f >= fmin && **f <= fmax)
        .map(|(k, _)| k)
        .collect();
    if bins.is_empty() {
        return Err(ExecInvariantViolation::InvalidState {
            reason: "no frequency bin lies inside the requested band",
        });
    }

    let ten = T::from(10.0).ok_or(ExecInvariantViolation::InvalidState {
        reason: "decibel scale is not representable",
    })?;
    let psd = psd.view().into_dyn();
    let last = Axis(psd.ndim() - 1);
    let mut mean_db = Vec::with_capacity(bins.len());
    let mut std_db = Vec::with_capacity(bins.len());
    for &k in &bins {
        let column = psd.index_axis(last, k);
        let db = column.iter().map(|&p| ten * p.log10());
        mean_db.push(mean(db.clone()).0);
        std_db.push(stdev(db).0);
    }

    Ok(PsdSummary {
        freqs: bins.iter().map(|&k| freqs[k]).collect(),
        mean_db: Array1::from(mean_db),
        std_db: Array1::from(std_db),
    })
}
