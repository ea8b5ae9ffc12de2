//! Validated record of a frequency-tagging recording's spectra.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle};
use crate::signal::traits::{FrequencySelectNd, SnrSpectrumNd};
use crate::signal::{
    psd_db_summary, snr_spectrum_summary, topography_average, PsdSummary, SnrAtFrequencyConfig,
    SnrAtFrequencyKernel, SnrSpectrumConfig, SnrSpectrumKernel, SnrSpectrumSummary,
};
use core::iter::Sum;
use itertools::Itertools;
use log::debug;
use ndarray::{Array, Array1, ArrayD, Dimension};
use num_traits::Float;

/// PSD estimates of one recording together with their frequency axis,
/// channel labels and stimulation frequencies.
///
/// The record is validated once at construction. The SNR spectrum slot is
/// filled by [`FtSpectra::with_snr_spectrum`], which returns a new record.
#[derive(Debug, Clone, PartialEq)]
pub struct FtSpectra<T> {
    frequency_bins: Array1<f64>,
    psd: ArrayD<T>,
    ch_names: Vec<String>,
    stim_freqs: Vec<f64>,
    snr: Option<ArrayD<T>>,
}

impl<T> FtSpectra<T>
where
    T: Float + Default + Sum,
{
    /// Bundle and validate spectra.
    ///
    /// `psd` is `[channels x freqs]` or `[trials x channels x freqs]`; its last
    /// axis must match `frequency_bins` and the axis before it `ch_names`.
    pub fn try_new<D>(
        frequency_bins: Array1<f64>,
        psd: Array<T, D>,
        ch_names: Vec<String>,
        stim_freqs: Vec<f64>,
    ) -> Result<Self, ExecInvariantViolation>
    where
        D: Dimension,
    {
        if frequency_bins.is_empty() {
            return Err(ConfigError::EmptyInput {
                arg: "frequency_bins",
            }
            .into());
        }
        if !frequency_bins.iter().tuple_windows().all(|(a, b)| b > a) {
            return Err(ConfigError::InvalidArgument {
                arg: "frequency_bins",
                reason: "frequency bins must be strictly increasing",
            }
            .into());
        }
        if stim_freqs.iter().any(|f| !f.is_finite()) {
            return Err(ConfigError::InvalidArgument {
                arg: "stim_freqs",
                reason: "stimulation frequencies must be finite",
            }
            .into());
        }

        let psd = psd.into_dyn();
        let rank = psd.ndim();
        if !(2..=3).contains(&rank) {
            return Err(ExecInvariantViolation::UnsupportedRank {
                arg: "psd",
                rank,
                expected: "2 or 3",
            });
        }
        let shape = psd.shape();
        if shape[rank - 1] != frequency_bins.len() {
            return Err(ExecInvariantViolation::AxisMismatch {
                arg: "psd",
                axis: rank - 1,
                expected: frequency_bins.len(),
                got: shape[rank - 1],
            });
        }
        if shape[rank - 2] != ch_names.len() {
            return Err(ExecInvariantViolation::AxisMismatch {
                arg: "ch_names",
                axis: rank - 2,
                expected: shape[rank - 2],
                got: ch_names.len(),
            });
        }

        debug!(
            "spectra of shape {:?} over {:.3}..{:.3} Hz, stimulation at {:?} Hz",
            shape,
            frequency_bins[0],
            frequency_bins[frequency_bins.len() - 1],
            stim_freqs
        );
        Ok(Self {
            frequency_bins,
            psd,
            ch_names,
            stim_freqs,
            snr: None,
        })
    }

    /// Derive the SNR spectrum, returning a record with the SNR slot filled.
    pub fn with_snr_spectrum(self, config: SnrSpectrumConfig) -> Result<Self, ExecInvariantViolation> {
        if self.snr.is_some() {
            return Err(ExecInvariantViolation::InvalidState {
                reason: "snr spectrum has already been derived",
            });
        }
        let kernel = SnrSpectrumKernel::try_new(config)?;
        let snr = kernel.run_with_bins(&self.psd, &self.frequency_bins)?;
        Ok(Self {
            snr: Some(snr),
            ..self
        })
    }

    /// Frequency axis in Hz.
    pub fn frequency_bins(&self) -> &Array1<f64> {
        &self.frequency_bins
    }

    /// PSD tensor.
    pub fn psd(&self) -> &ArrayD<T> {
        &self.psd
    }

    /// SNR tensor, once derived.
    pub fn snr(&self) -> Option<&ArrayD<T>> {
        self.snr.as_ref()
    }

    /// Channel labels, one per entry of the channel axis.
    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    /// Stimulation frequencies in Hz.
    pub fn stim_freqs(&self) -> &[f64] {
        &self.stim_freqs
    }

    /// Shape of the PSD tensor.
    pub fn dim(&self) -> &[usize] {
        self.psd.shape()
    }

    fn require_snr(&self) -> Result<&ArrayD<T>, ExecInvariantViolation> {
        self.snr.as_ref().ok_or(ExecInvariantViolation::InvalidState {
            reason: "snr spectrum has not been derived yet",
        })
    }

    /// SNR at the bin nearest to the `idx`-th stimulation frequency.
    pub fn snr_at_stim_frequency(&self, idx: usize) -> Result<ArrayD<T>, ExecInvariantViolation> {
        let snr = self.require_snr()?;
        let target_freq =
            *self
                .stim_freqs
                .get(idx)
                .ok_or(ExecInvariantViolation::InvalidState {
                    reason: "no stimulation frequency at that index",
                })?;
        let kernel = SnrAtFrequencyKernel::try_new(SnrAtFrequencyConfig { target_freq })?;
        kernel.run_alloc(snr, &self.frequency_bins)
    }

    /// Per-channel grand-average SNR at the `idx`-th stimulation frequency,
    /// in `ch_names` order.
    pub fn topography(&self, idx: usize) -> Result<Array1<T>, ExecInvariantViolation> {
        let topo = topography_average(&self.snr_at_stim_frequency(idx)?)?;
        if topo.len() != self.ch_names.len() {
            return Err(ExecInvariantViolation::AxisMismatch {
                arg: "ch_names",
                axis: 0,
                expected: topo.len(),
                got: self.ch_names.len(),
            });
        }
        Ok(topo)
    }

    /// Grand-average SNR spectrum with per-trial and per-channel averages.
    pub fn snr_spectrum_summary(&self) -> Result<SnrSpectrumSummary<T>, ExecInvariantViolation> {
        snr_spectrum_summary(self.require_snr()?)
    }

    /// Decibel summary of the PSD between `fmin` and `fmax`.
    pub fn psd_summary(
        &self,
        fmin: Option<f64>,
        fmax: Option<f64>,
    ) -> Result<PsdSummary<T>, ExecInvariantViolation> {
        psd_db_summary(&self.psd, &self.frequency_bins, fmin, fmax)
    }
}
