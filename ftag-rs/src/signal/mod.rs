//! Spectrum kernels for frequency-tagging analysis.
//!
//! Tensors follow the `[trials x channels x freqs]` convention, with the
//! trial axis optional. The last axis always lines up with the frequency
//! axis the spectrum was estimated on.

mod aggregate;
mod layout;
mod psd;
mod select;
mod snr;
pub mod traits;

pub use aggregate::*;
pub use psd::*;
pub use select::*;
pub use snr::*;
