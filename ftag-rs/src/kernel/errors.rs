use thiserror::Error;

/// Validation errors raised at kernel construction or adapter binding time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required input or configuration field is empty.
    #[error("Input `{arg}` was empty.")]
    EmptyInput {
        /// Name of the argument that is empty.
        arg: &'static str,
    },
    /// A configuration argument value is invalid.
    #[error("Invalid argument `{arg}`: {reason}")]
    InvalidArgument {
        /// Name of the argument.
        arg: &'static str,
        /// Human readable reason.
        reason: &'static str,
    },
    /// A contiguous 1D slice view could not be obtained.
    #[error("Argument `{arg}` is not contiguous in memory.")]
    NonContiguous {
        /// Name of the argument that is non-contiguous.
        arg: &'static str,
    },
}

/// Runtime execution invariant violations for checked kernel entrypoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecInvariantViolation {
    /// An execution precondition was violated.
    #[error("Execution invariant violation: {reason}")]
    InvalidState {
        /// Human readable reason.
        reason: &'static str,
    },
    /// A tensor had a rank the operation does not accept.
    #[error("Unsupported rank {rank} for `{arg}`, expected {expected}.")]
    UnsupportedRank {
        /// Name of the argument.
        arg: &'static str,
        /// Rank that was received.
        rank: usize,
        /// Accepted ranks.
        expected: &'static str,
    },
    /// One axis of a tensor disagrees with its companion argument.
    #[error("Shape mismatch on `{arg}` axis {axis}. Expected {expected}, got {got}.")]
    AxisMismatch {
        /// Name of the argument.
        arg: &'static str,
        /// Axis index that was checked.
        axis: usize,
        /// Required length.
        expected: usize,
        /// Received length.
        got: usize,
    },
    /// A whole tensor shape disagrees with the required shape.
    #[error("Shape mismatch on `{arg}`. Expected {expected:?}, got {got:?}.")]
    ShapeMismatch {
        /// Name of the argument.
        arg: &'static str,
        /// Required shape.
        expected: Vec<usize>,
        /// Received shape.
        got: Vec<usize>,
    },
    /// Adapter binding/configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_convert_into_exec_violations() {
        let err: ExecInvariantViolation = ConfigError::EmptyInput { arg: "freqs" }.into();
        assert_eq!(
            err,
            ExecInvariantViolation::Config(ConfigError::EmptyInput { arg: "freqs" })
        );
        assert_eq!(err.to_string(), "Input `freqs` was empty.");
    }

    #[test]
    fn axis_mismatch_names_the_axis() {
        let err = ExecInvariantViolation::AxisMismatch {
            arg: "psd",
            axis: 1,
            expected: 64,
            got: 63,
        };
        assert_eq!(
            err.to_string(),
            "Shape mismatch on `psd` axis 1. Expected 64, got 63."
        );
    }
}
