//! Order book configuration.
//!
//! ## Example
//!
//! ```
//! use critbit_lob::config::BookConfig;
//!
//! let config = BookConfig::default()
//!     .with_scale_factor(1_000)
//!     .with_capacity(10_000);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::ConfigError;

/// Parameters fixed when a book is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookConfig {
    /// Base subunits per lot, supplied by the market registry
    pub scale_factor: u64,

    /// Orders per side to pre-allocate tree storage for
    pub capacity: usize,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            scale_factor: 1,
            capacity: 0,
        }
    }
}

impl BookConfig {
    pub fn with_scale_factor(mut self, scale_factor: u64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Reject values no book can work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scale_factor == 0 {
            return Err(ConfigError::ZeroScaleFactor);
        }
        Ok(())
    }
}
