use super::ConfigError;

/// Constructor validation lifecycle shared by kernel structs.
pub trait KernelLifecycle: Sized {
    /// Kernel config type.
    type Config;

    /// Construct a validated kernel from config.
    fn try_new(config: Self::Config) -> Result<Self, ConfigError>;
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, KernelLifecycle};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct BandConfig {
        low_hz: f64,
        high_hz: f64,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct BandKernel {
        low_hz: f64,
        high_hz: f64,
    }

    impl KernelLifecycle for BandKernel {
        type Config = BandConfig;

        fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
            if !(config.low_hz < config.high_hz) {
                return Err(ConfigError::InvalidArgument {
                    arg: "low_hz",
                    reason: "band edges must be increasing",
                });
            }
            Ok(Self {
                low_hz: config.low_hz,
                high_hz: config.high_hz,
            })
        }
    }

    #[test]
    fn lifecycle_constructor_accepts_valid_config() {
        let kernel = BandKernel::try_new(BandConfig {
            low_hz: 8.0,
            high_hz: 13.0,
        })
        .expect("valid config");
        assert_eq!(kernel.high_hz - kernel.low_hz, 5.0);
    }

    #[test]
    fn lifecycle_constructor_rejects_invalid_config() {
        let err = BandKernel::try_new(BandConfig {
            low_hz: 13.0,
            high_hz: 8.0,
        })
        .expect_err("invalid config");
        assert_eq!(
            err,
            ConfigError::InvalidArgument {
                arg: "low_hz",
                reason: "band edges must be increasing",
            }
        );
    }
}
