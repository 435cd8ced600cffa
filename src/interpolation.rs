// Pairwise interpolation laws and their closed-form interval integrals

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DistributionError, Result};

/// Interpolation law applied between two adjacent grid points.
///
/// The naming follows the ENDF convention of "y-axis first": `LinearLog`
/// means y is linear in ln(x), `LogLinear` means ln(y) is linear in x.
///
/// A logarithmic y axis needs both end values non-zero and of one sign.
/// Other intervals fall back to the law with a linear y axis, so a zero
/// value (a density outside its support, say) never produces NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterpolationType {
    #[serde(rename = "lin-lin")]
    LinearLinear,
    #[serde(rename = "lin-log")]
    LinearLog,
    #[serde(rename = "log-lin")]
    LogLinear,
    #[serde(rename = "log-log")]
    LogLog,
}

impl InterpolationType {
    /// Map an ENDF interpolation code (INT) onto a law.
    ///
    /// Histogram (1) and the special codes above 5 have no counterpart here.
    pub fn from_endf(code: i32) -> Result<Self> {
        match code {
            2 => Ok(InterpolationType::LinearLinear),
            3 => Ok(InterpolationType::LinearLog),
            4 => Ok(InterpolationType::LogLinear),
            5 => Ok(InterpolationType::LogLog),
            _ => Err(DistributionError::invalid_input(format!(
                "unsupported ENDF interpolation code: {}",
                code
            ))),
        }
    }

    /// ENDF interpolation code for this law
    pub fn endf_code(self) -> i32 {
        match self {
            InterpolationType::LinearLinear => 2,
            InterpolationType::LinearLog => 3,
            InterpolationType::LogLinear => 4,
            InterpolationType::LogLog => 5,
        }
    }

    pub fn is_linear(self) -> bool {
        self == InterpolationType::LinearLinear
    }

    /// Law actually applied to an interval with end values `y1` and `y2`
    fn for_values(self, y1: f64, y2: f64) -> Self {
        let same_sign = (y1 > 0.0 && y2 > 0.0) || (y1 < 0.0 && y2 < 0.0);
        match self {
            InterpolationType::LogLinear if !same_sign => InterpolationType::LinearLinear,
            InterpolationType::LogLog if !same_sign => InterpolationType::LinearLog,
            law => law,
        }
    }

    /// Interpolate between (x1, y1) and (x2, y2) at x.
    ///
    /// Callers guarantee x1 < x2; degenerate intervals never reach here.
    #[inline]
    pub fn interpolate(self, x: f64, x1: f64, x2: f64, y1: f64, y2: f64) -> f64 {
        match self.for_values(y1, y2) {
            InterpolationType::LinearLinear => y1 + (x - x1) * (y2 - y1) / (x2 - x1),
            InterpolationType::LinearLog => {
                y1 + (y2 - y1) * (x / x1).ln() / (x2 / x1).ln()
            }
            InterpolationType::LogLinear => {
                if y1 == y2 {
                    return y1;
                }
                y1 * (y2 / y1).powf((x - x1) / (x2 - x1))
            }
            InterpolationType::LogLog => {
                if y1 == y2 {
                    return y1;
                }
                y1 * (y2 / y1).powf((x / x1).ln() / (x2 / x1).ln())
            }
        }
    }

    /// Integral of the interpolant over [x1, x2]
    pub fn integral(self, x1: f64, x2: f64, y1: f64, y2: f64) -> f64 {
        let dx = x2 - x1;
        if dx == 0.0 {
            return 0.0;
        }
        match self.for_values(y1, y2) {
            InterpolationType::LinearLinear => 0.5 * dx * (y1 + y2),
            InterpolationType::LinearLog => {
                // y = y1 + c ln(x/x1)
                let log_ratio = (x2 / x1).ln();
                let c = (y2 - y1) / log_ratio;
                y1 * dx + c * (x2 * log_ratio - dx)
            }
            InterpolationType::LogLinear => {
                // y = y1 exp(b (x - x1))
                if y1 == y2 {
                    return y1 * dx;
                }
                let b = (y2 / y1).ln() / dx;
                (y2 - y1) / b
            }
            InterpolationType::LogLog => {
                // y = y1 (x/x1)^a
                if y1 == y2 {
                    return y1 * dx;
                }
                let a = (y2 / y1).ln() / (x2 / x1).ln();
                if (a + 1.0).abs() < 1e-12 {
                    y1 * x1 * (x2 / x1).ln()
                } else {
                    (x2 * y2 - x1 * y1) / (a + 1.0)
                }
            }
        }
    }

    /// First moment (integral of x times the interpolant) over [x1, x2]
    pub fn first_moment(self, x1: f64, x2: f64, y1: f64, y2: f64) -> f64 {
        let dx = x2 - x1;
        if dx == 0.0 {
            return 0.0;
        }
        match self.for_values(y1, y2) {
            InterpolationType::LinearLinear => {
                dx / 6.0 * (x1 * (2.0 * y1 + y2) + x2 * (y1 + 2.0 * y2))
            }
            InterpolationType::LinearLog => {
                let log_ratio = (x2 / x1).ln();
                let c = (y2 - y1) / log_ratio;
                let x1_sq = x1 * x1;
                let x2_sq = x2 * x2;
                0.5 * y1 * (x2_sq - x1_sq)
                    + c * (0.5 * x2_sq * log_ratio - 0.25 * (x2_sq - x1_sq))
            }
            InterpolationType::LogLinear => {
                if y1 == y2 {
                    return 0.5 * y1 * (x2 * x2 - x1 * x1);
                }
                let b = (y2 / y1).ln() / dx;
                (x2 * y2 - x1 * y1) / b - (y2 - y1) / (b * b)
            }
            InterpolationType::LogLog => {
                let a = if y1 == y2 {
                    0.0
                } else {
                    (y2 / y1).ln() / (x2 / x1).ln()
                };
                if (a + 2.0).abs() < 1e-12 {
                    y1 * x1 * x1 * (x2 / x1).ln()
                } else {
                    (x2 * x2 * y2 - x1 * x1 * y1) / (a + 2.0)
                }
            }
        }
    }
}

impl Default for InterpolationType {
    fn default() -> Self {
        InterpolationType::LinearLinear
    }
}

impl fmt::Display for InterpolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InterpolationType::LinearLinear => "lin-lin",
            InterpolationType::LinearLog => "lin-log",
            InterpolationType::LogLinear => "log-lin",
            InterpolationType::LogLog => "log-log",
        };
        write!(f, "{}", name)
    }
}
