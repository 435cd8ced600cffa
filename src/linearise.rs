// Adaptive midpoint bisection shared by tables and series

use serde::{Deserialize, Serialize};

use crate::config::{Config, DEFAULT_ABSOLUTE_TOLERANCE, DEFAULT_MAX_REFINEMENT_DEPTH};
use crate::error::{DistributionError, Result};

/// Accuracy requested from a linearisation.
///
/// A chord is accepted at a midpoint `x` when
/// `|f(x) - chord(x)| <= max(relative * |f(x)|, absolute)`. The absolute
/// floor keeps the refinement finite where the function approaches zero.
/// An interval that still fails after `max_depth` halvings makes the
/// linearisation fail with `Unsupported`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearisationTolerance {
    relative: f64,
    absolute: f64,
    #[serde(default = "default_max_depth")]
    max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_REFINEMENT_DEPTH
}

impl LinearisationTolerance {
    pub fn new(relative: f64, absolute: f64) -> Result<Self> {
        if !relative.is_finite() || !absolute.is_finite() {
            return Err(DistributionError::invalid_input(
                "linearisation tolerances must be finite",
            ));
        }
        if relative < 0.0 || absolute < 0.0 {
            return Err(DistributionError::invalid_input(format!(
                "linearisation tolerances must be non-negative, got relative={} absolute={}",
                relative, absolute
            )));
        }
        if relative == 0.0 && absolute == 0.0 {
            return Err(DistributionError::invalid_input(
                "at least one of the relative and absolute tolerances must be positive",
            ));
        }
        Ok(Self::from_parts(relative, absolute, DEFAULT_MAX_REFINEMENT_DEPTH))
    }

    /// Pure relative tolerance with the default absolute floor
    pub fn relative_only(relative: f64) -> Result<Self> {
        Self::new(relative, DEFAULT_ABSOLUTE_TOLERANCE)
    }

    /// Same accuracy with a different bisection depth limit
    pub fn with_max_depth(self, max_depth: usize) -> Result<Self> {
        if max_depth == 0 {
            return Err(DistributionError::invalid_input(
                "maximum refinement depth must be at least 1",
            ));
        }
        Ok(LinearisationTolerance { max_depth, ..self })
    }

    pub(crate) const fn from_parts(relative: f64, absolute: f64, max_depth: usize) -> Self {
        LinearisationTolerance {
            relative,
            absolute,
            max_depth,
        }
    }

    pub fn relative(&self) -> f64 {
        self.relative
    }

    pub fn absolute(&self) -> f64 {
        self.absolute
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Largest discrepancy accepted around a reference value
    #[inline]
    pub fn threshold(&self, reference: f64) -> f64 {
        (self.relative * reference.abs()).max(self.absolute)
    }

    /// Whether `approximation` is close enough to `exact`
    #[inline]
    pub fn accepts(&self, exact: f64, approximation: f64) -> bool {
        (exact - approximation).abs() <= self.threshold(exact)
    }
}

impl Default for LinearisationTolerance {
    /// Copy of the global configuration's tolerance.
    ///
    /// This locks [`Config::global`], so it must not be called while a guard
    /// on the global configuration is held.
    fn default() -> Self {
        Config::global().tolerance
    }
}

/// Refine the chord between `(x1, y1)` and `(x2, y2)` until it reproduces
/// `function` within `tolerance` at every midpoint.
///
/// Returns the points after `x1` up to and including `x2`, in increasing
/// order. The refinement runs from an explicit worklist; an interval that
/// still fails after the tolerance's `max_depth` halvings is reported as
/// `Unsupported`.
pub(crate) fn linearise_interval<F>(
    function: &F,
    (x1, y1): (f64, f64),
    (x2, y2): (f64, f64),
    tolerance: &LinearisationTolerance,
) -> Result<Vec<(f64, f64)>>
where
    F: Fn(f64) -> f64,
{
    let max_depth = tolerance.max_depth();
    let mut points = Vec::new();
    // Left halves are pushed last so they are popped first
    let mut stack = vec![(x1, y1, x2, y2, 0usize)];

    while let Some((a, fa, b, fb, depth)) = stack.pop() {
        let mid = 0.5 * (a + b);
        if !(mid > a && mid < b) {
            // interval is at floating point resolution
            points.push((b, fb));
            continue;
        }

        let exact = function(mid);
        let chord = 0.5 * (fa + fb);
        if tolerance.accepts(exact, chord) {
            points.push((b, fb));
            continue;
        }

        if depth >= max_depth {
            return Err(DistributionError::unsupported(format!(
                "linearisation did not converge on [{}, {}] after {} bisections (f({}) = {})",
                x1, x2, max_depth, mid, exact
            )));
        }
        stack.push((mid, exact, b, fb, depth + 1));
        stack.push((a, fa, mid, exact, depth + 1));
    }

    tracing::trace!(x1, x2, inserted = points.len() - 1, "refined interval");
    Ok(points)
}
