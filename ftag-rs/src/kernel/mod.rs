//! Shared trait-first kernel substrate.
//!
//! Constructor validation, error types and the 1D input adapters used by the
//! spectrum kernels.

mod errors;
mod io;
mod lifecycle;

pub use errors::*;
pub use io::*;
pub use lifecycle::*;
