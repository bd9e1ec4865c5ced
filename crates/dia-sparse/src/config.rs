//! Tuning knobs for building DIA matrices from coordinate data
//!
//! # Example
//!
//! ```
//! use dia_sparse::config::ConversionConfig;
//!
//! let config = ConversionConfig::default()
//!     .with_efficiency_warning_diagonals(16)
//!     .with_drop_zeros(true);
//! assert_eq!(config.efficiency_warning_diagonals, 16);
//! assert!(config.drop_zeros);
//! ```

/// Default diagonal count above which DIA storage is flagged as inefficient
pub const DEFAULT_EFFICIENCY_WARNING_DIAGONALS: usize = 100;

/// Coordinate → DIA conversion configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionConfig {
    /// Log a warning when the result stores more diagonals than this
    pub efficiency_warning_diagonals: usize,
    /// Drop explicit zero values before building diagonals
    pub drop_zeros: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            efficiency_warning_diagonals: DEFAULT_EFFICIENCY_WARNING_DIAGONALS,
            drop_zeros: false,
        }
    }
}

impl ConversionConfig {
    /// Set the diagonal count that triggers the inefficiency warning
    pub fn with_efficiency_warning_diagonals(mut self, diagonals: usize) -> Self {
        self.efficiency_warning_diagonals = diagonals;
        self
    }

    /// Set whether explicit zeros are dropped
    pub fn with_drop_zeros(mut self, drop_zeros: bool) -> Self {
        self.drop_zeros = drop_zeros;
        self
    }

    /// Returns true if `num_diagonals` exceeds the efficiency threshold
    pub fn is_inefficient(&self, num_diagonals: usize) -> bool {
        num_diagonals > self.efficiency_warning_diagonals
    }
}
