//! High-level fit configuration with builder pattern.
//!
//! [`VlmcConfig`] gathers everything a fit needs besides the vocabulary and
//! the sample. It uses the `bon` crate for builder generation and validates
//! on `build()`.
//!
//! # Example
//!
//! ```
//! use vlmc::{PruningMethod, Verbosity, VlmcConfig};
//!
//! // Only the maximum order is required
//! let config = VlmcConfig::builder().max_order(4).build().unwrap();
//! assert!(config.make_admissible);
//!
//! let config = VlmcConfig::builder()
//!     .max_order(6)
//!     .method(PruningMethod::bct(0.3))
//!     .n_threads(4)
//!     .verbosity(Verbosity::Info)
//!     .build()
//!     .unwrap();
//!
//! assert!(VlmcConfig::builder().max_order(0).build().is_err());
//! ```

use bon::Builder;

use crate::error::ConfigError;
use crate::logger::Verbosity;
use crate::solvers::{Pruner, PruningMethod};

/// Configuration for fitting a [`VlmcModel`](super::VlmcModel).
///
/// # Structure
///
/// - **Tree**: `max_order` and whether to reduce to an admissible tree
/// - **Pruning**: the criterion and its parameters, via [`PruningMethod`]
/// - **Resources**: worker threads for counting
/// - **Logging**: [`Verbosity`] of the fit logger
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct VlmcConfig {
    // === Tree ===
    /// Maximum context length of the initial full tree. Must be at least 1.
    pub max_order: usize,

    /// Truncate to `floor(ln n)`, drop contexts that never occur, collapse
    /// single-child nodes and verify sample coverage. Default: `true`.
    #[builder(default = true)]
    pub make_admissible: bool,

    // === Pruning ===
    /// Pruning criterion. Default: BIC.
    #[builder(default)]
    pub method: PruningMethod,

    // === Resource control ===
    /// Number of threads: 0 = auto, 1 = sequential, >1 = exact count. Default: 0.
    #[builder(default)]
    pub n_threads: usize,

    // === Logging ===
    /// Verbosity level. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,
}

/// Custom finishing function that validates the config.
impl<S: vlmc_config_builder::IsComplete> VlmcConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any parameter is invalid:
    /// - `max_order == 0`
    /// - solver parameters out of range (see [`Pruner::validate`])
    pub fn build(self) -> Result<VlmcConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl VlmcConfig {
    /// Validate the configuration.
    ///
    /// Called by the builder; fits call it again since fields are public.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_order == 0 {
            return Err(ConfigError::InvalidMaxOrder(self.max_order));
        }
        self.method.validate()
    }
}
