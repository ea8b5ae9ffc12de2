#![deny(missing_debug_implementations)]
//! Frequency-tagging analysis of power spectral densities.
//!
//! Periodic stimulation at a known frequency drives a narrow-band response
//! in EEG/MEG recordings. This crate turns PSD estimates into signal-to-noise
//! spectra, selects SNR values at the stimulation frequencies and reduces them
//! into the averages used for spectra and topography views.
//!
//! ```
//! use ftag_rs::signal::{snr_at_frequency, snr_spectrum};
//! use ndarray::Array2;
//!
//! let freqs: Vec<f64> = (0..40).map(|k| k as f64 * 0.5).collect();
//! let psd = Array2::from_shape_fn((2, 40), |(_, k)| if k == 24 { 9.0 } else { 1.0 });
//!
//! let snr = snr_spectrum(&psd, 3, 1).unwrap();
//! let at = snr_at_frequency(&snr, &freqs, 12.0).unwrap();
//! assert_eq!(at.as_slice().unwrap(), &[9.0, 9.0]);
//! ```

/// Kernel lifecycle, input adapters and error types
pub mod kernel;

/// SNR spectra, frequency selection and spectrum reductions
pub mod signal;

/// Validated spectra record
pub mod spectra;

/// Statistical reductions
pub mod stats;

pub use spectra::FtSpectra;
