// Global defaults used when linearising tables and series
use once_cell::sync::Lazy;
use std::sync::Mutex;

use crate::error::Result;
use crate::linearise::LinearisationTolerance;

/// Relative accuracy used when no tolerance is supplied explicitly
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-3;
/// Absolute floor below which differences are always accepted
pub const DEFAULT_ABSOLUTE_TOLERANCE: f64 = 1e-10;
/// Maximum number of times a single interval may be halved
pub const DEFAULT_MAX_REFINEMENT_DEPTH: usize = 40;

// Global linearisation defaults
pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::new()));

/// Process-wide defaults for the numeric machinery.
///
/// A single global instance is exposed via the `CONFIG` static (a
/// `Lazy<Mutex<Config>>`). Code should obtain a guard with [`Config::global`]
/// rather than locking the mutex directly. Operations never read the global
/// themselves: they take a [`LinearisationTolerance`], and only
/// `LinearisationTolerance::default()` copies the global one.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Tolerance and bisection depth used by `LinearisationTolerance::default()`
    pub tolerance: LinearisationTolerance,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Config {
            tolerance: LinearisationTolerance::from_parts(
                DEFAULT_RELATIVE_TOLERANCE,
                DEFAULT_ABSOLUTE_TOLERANCE,
                DEFAULT_MAX_REFINEMENT_DEPTH,
            ),
        }
    }

    /// Replace the default tolerance, validating the pair first.
    ///
    /// The configured refinement depth is kept.
    pub fn set_tolerance(&mut self, relative: f64, absolute: f64) -> Result<()> {
        self.tolerance = LinearisationTolerance::new(relative, absolute)?
            .with_max_depth(self.tolerance.max_depth())?;
        Ok(())
    }

    pub fn max_refinement_depth(&self) -> usize {
        self.tolerance.max_depth()
    }

    pub fn set_max_refinement_depth(&mut self, depth: usize) -> Result<()> {
        self.tolerance = self.tolerance.with_max_depth(depth)?;
        Ok(())
    }

    /// Restore every field to its default
    pub fn reset(&mut self) {
        *self = Config::new();
    }

    /// Get the global configuration instance
    pub fn global() -> std::sync::MutexGuard<'static, Self> {
        CONFIG
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::new();
        assert_eq!(config.tolerance.relative(), DEFAULT_RELATIVE_TOLERANCE);
        assert_eq!(config.tolerance.absolute(), DEFAULT_ABSOLUTE_TOLERANCE);
        assert_eq!(config.max_refinement_depth(), DEFAULT_MAX_REFINEMENT_DEPTH);
    }

    #[test]
    fn test_set_tolerance() {
        let mut config = Config::new();
        config.set_tolerance(1e-2, 1e-6).unwrap();
        assert_eq!(config.tolerance.relative(), 1e-2);
        assert_eq!(config.tolerance.absolute(), 1e-6);
    }

    #[test]
    fn test_set_invalid_tolerance_keeps_previous() {
        let mut config = Config::new();
        assert!(config.set_tolerance(-1.0, 0.0).is_err());
        assert_eq!(config.tolerance.relative(), DEFAULT_RELATIVE_TOLERANCE);
    }

    #[test]
    fn test_set_max_refinement_depth() {
        let mut config = Config::new();
        assert!(config.set_max_refinement_depth(0).is_err());
        config.set_max_refinement_depth(12).unwrap();
        assert_eq!(config.max_refinement_depth(), 12);
        config.set_tolerance(1e-2, 1e-6).unwrap();
        assert_eq!(config.tolerance.max_depth(), 12);
        config.reset();
        assert_eq!(config.max_refinement_depth(), DEFAULT_MAX_REFINEMENT_DEPTH);
    }

    #[test]
    fn test_global_is_usable() {
        let depth = Config::global().max_refinement_depth();
        assert!(depth > 0);
    }
}
