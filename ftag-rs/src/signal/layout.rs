//! Canonical tensor layout for spectrum kernels.
//!
//! Spectra arrive as `[channels x freqs]` or `[trials x channels x freqs]`.
//! Kernels work on the rank-3 form only: [`canonicalize`] inserts a singleton
//! trial axis where needed and [`restore`] removes it again, so the output
//! always has the caller's dimensionality.

use crate::kernel::ExecInvariantViolation;
use ndarray::{Array, Array3, ArrayBase, ArrayView3, Axis, Data, Dimension, Ix2, Ix3};

/// Layout a spectrum tensor was received in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpectrumLayout {
    /// `[channels x freqs]`
    Channels,
    /// `[trials x channels x freqs]`
    TrialsChannels,
}

/// View any rank-2/3 spectrum as `[trials x channels x freqs]`.
pub(crate) fn canonicalize<'a, T, S, D>(
    arg: &'static str,
    a: &'a ArrayBase<S, D>,
) -> Result<(ArrayView3<'a, T>, SpectrumLayout), ExecInvariantViolation>
where
    S: Data<Elem = T>,
    D: Dimension,
{
    let view = a.view().into_dyn();
    match view.ndim() {
        2 => {
            let view = view
                .into_dimensionality::<Ix2>()
                .map_err(|_| ExecInvariantViolation::InvalidState {
                    reason: "rank-2 spectrum could not be viewed as a matrix",
                })?;
            Ok((view.insert_axis(Axis(0)), SpectrumLayout::Channels))
        }
        3 => {
            let view = view
                .into_dimensionality::<Ix3>()
                .map_err(|_| ExecInvariantViolation::InvalidState {
                    reason: "rank-3 spectrum could not be viewed as a cube",
                })?;
            Ok((view, SpectrumLayout::TrialsChannels))
        }
        rank => Err(ExecInvariantViolation::UnsupportedRank {
            arg,
            rank,
            expected: "2 or 3",
        }),
    }
}

/// Undo [`canonicalize`] on a computed rank-3 result.
pub(crate) fn restore<T, D>(
    out: Array3<T>,
    layout: SpectrumLayout,
) -> Result<Array<T, D>, ExecInvariantViolation>
where
    D: Dimension,
{
    let out = match layout {
        SpectrumLayout::Channels => out.index_axis_move(Axis(0), 0).into_dyn(),
        SpectrumLayout::TrialsChannels => out.into_dyn(),
    };
    out.into_dimensionality::<D>()
        .map_err(|_| ExecInvariantViolation::InvalidState {
            reason: "spectrum result does not match the input dimensionality",
        })
}

/// Check that the last axis of `a` spans exactly `n_freqs` bins.
pub(crate) fn check_freq_axis<S, D>(
    arg: &'static str,
    a: &ArrayBase<S, D>,
    n_freqs: usize,
) -> Result<(), ExecInvariantViolation>
where
    S: Data,
    D: Dimension,
{
    let Some(axis) = a.ndim().checked_sub(1) else {
        return Err(ExecInvariantViolation::UnsupportedRank {
            arg,
            rank: 0,
            expected: "at least 1",
        });
    };
    let got = a.len_of(Axis(axis));
    if got != n_freqs {
        return Err(ExecInvariantViolation::AxisMismatch {
            arg,
            axis,
            expected: n_freqs,
            got,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array2, Ix1, IxDyn};

    #[test]
    fn rank_two_gains_a_singleton_trial_axis() {
        let psd = Array2::<f64>::zeros((4, 16));
        let (view, layout) = canonicalize("psd", &psd).expect("rank 2");
        assert_eq!(view.shape(), &[1, 4, 16]);
        assert_eq!(layout, SpectrumLayout::Channels);

        let back: Array2<f64> = restore(view.to_owned(), layout).expect("restore");
        assert_eq!(back.shape(), psd.shape());
    }

    #[test]
    fn dynamic_rank_round_trips_through_ixdyn() {
        let psd = Array::<f32, _>::zeros(IxDyn(&[2, 3, 8]));
        let (view, layout) = canonicalize("psd", &psd).expect("rank 3");
        assert_eq!(layout, SpectrumLayout::TrialsChannels);
        let back: Array<f32, IxDyn> = restore(view.to_owned(), layout).expect("restore");
        assert_eq!(back.shape(), &[2, 3, 8]);
    }

    #[test]
    fn other_ranks_are_rejected() {
        let flat = Array::<f64, Ix1>::zeros(8);
        assert_eq!(
            canonicalize("psd", &flat).map(|(_, layout)| layout),
            Err(ExecInvariantViolation::UnsupportedRank {
                arg: "psd",
                rank: 1,
                expected: "2 or 3",
            })
        );
        let deep = Array::<f64, _>::zeros(IxDyn(&[1, 2, 3, 4]));
        assert!(matches!(
            canonicalize("psd", &deep),
            Err(ExecInvariantViolation::UnsupportedRank { rank: 4, .. })
        ));
    }

    #[test]
    fn freq_axis_check_reports_last_axis() {
        let psd = Array2::<f64>::zeros((4, 16));
        assert!(check_freq_axis("psd", &psd, 16).is_ok());
        assert_eq!(
            check_freq_axis("psd", &psd, 15),
            Err(ExecInvariantViolation::AxisMismatch {
                arg: "psd",
                axis: 1,
                expected: 15,
                got: 16,
            })
        );
    }
}
