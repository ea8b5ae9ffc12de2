//! Trait interfaces for spectrum capabilities.
//!
//! These traits define the trait-first API shape of the spectrum kernels.
//! Tensors are borrowed as generic [`ArrayBase`] so owned arrays, views and
//! dynamic-rank arrays are all accepted.

use crate::kernel::{ExecInvariantViolation, Read1D};
use ndarray::{Array, ArrayBase, ArrayD, Data, DataMut, Dimension};

/// SNR spectrum capability over `[channels x freqs]` or
/// `[trials x channels x freqs]` tensors.
pub trait SnrSpectrumNd<T> {
    /// Compute the SNR spectrum into a caller-provided tensor of the same shape.
    fn run_into<S, SO, D>(
        &self,
        psd: &ArrayBase<S, D>,
        out: &mut ArrayBase<SO, D>,
    ) -> Result<(), ExecInvariantViolation>
    where
        S: Data<Elem = T>,
        SO: DataMut<Elem = T>,
        D: Dimension;

    /// Compute the SNR spectrum and allocate output.
    fn run_alloc<S, D>(&self, psd: &ArrayBase<S, D>) -> Result<Array<T, D>, ExecInvariantViolation>
    where
        S: Data<Elem = T>,
        D: Dimension;

    /// Compute the SNR spectrum after checking the last axis against `freqs`.
    fn run_with_bins<S, D, I>(
        &self,
        psd: &ArrayBase<S, D>,
        freqs: &I,
    ) -> Result<Array<T, D>, ExecInvariantViolation>
    where
        S: Data<Elem = T>,
        D: Dimension,
        I: Read1D<f64> + ?Sized;
}

/// Nearest-bin frequency selection over rank 1-3 tensors.
pub trait FrequencySelectNd<T> {
    /// Slice `snr` at the nearest bin, consuming the frequency axis.
    fn run_alloc<S, D, I>(
        &self,
        snr: &ArrayBase<S, D>,
        freqs: &I,
    ) -> Result<ArrayD<T>, ExecInvariantViolation>
    where
        S: Data<Elem = T>,
        D: Dimension,
        I: Read1D<f64> + ?Sized;
}
