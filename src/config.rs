//! Facade construction configuration.
//!
//! A `#[serde(default)]` struct with a hand-written `Default`, a
//! `validate()` pass, and a `toml`-backed load helper.

use crate::error::{SakuraError, SakuraResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for one [`crate::facade::SakuraLang`] instance, generalized
/// from fixed constructor parameters into a loadable file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SakuraConfig {
    /// Fixed worker-pool size, configurable at facade construction.
    pub worker_count: usize,
    /// Enables `tracing` debug-level spans around dispatch.
    pub enable_debug: bool,
    /// Enables the cosmetic terminal-output separator printing behind the
    /// `terminal-output` feature.
    pub enable_terminal_output: bool,
}

impl Default for SakuraConfig {
    fn default() -> Self {
        SakuraConfig {
            worker_count: num_cpus::get().max(1),
            enable_debug: false,
            enable_terminal_output: false,
        }
    }
}

impl SakuraConfig {
    /// Reject configurations the facade cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`SakuraError::Validation`] if `worker_count` is zero.
    pub fn validate(&self) -> SakuraResult<()> {
        if self.worker_count == 0 {
            return Err(SakuraError::Validation {
                hierarchy: Vec::new(),
                message: "worker_count must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// Load a [`SakuraConfig`] from a TOML file, or the default
    /// configuration if `path` does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SakuraError::Io`] if the file exists but cannot be read, or
    /// [`SakuraError::Validation`] if the parsed (or default) configuration
    /// fails [`SakuraConfig::validate`].
    pub fn load(path: &Path) -> SakuraResult<SakuraConfig> {
        if !path.exists() {
            let config = SakuraConfig::default();
            config.validate()?;
            return Ok(config);
        }
        let contents = fs::read_to_string(path)?;
        let config: SakuraConfig = toml::from_str(&contents).map_err(|err| SakuraError::Io(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
