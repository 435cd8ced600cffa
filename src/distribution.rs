// Probability distributions: a density with an optional cumulative function

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::error::{DistributionError, Result};
use crate::legendre::LegendreSeries;
use crate::linearise::LinearisationTolerance;
use crate::tabulated_function::TabulatedFunction;

/// Common behaviour of a single (inner) distribution.
///
/// Implemented by [`TabulatedDistribution`] and [`LegendreDistribution`] so
/// that [`crate::GridDistributions`] can interpolate either of them.
pub trait Distribution: Clone + Debug + PartialEq {
    /// Probability density at `x`, zero outside the domain
    fn evaluate(&self, x: f64) -> f64;

    fn domain(&self) -> (f64, f64);

    /// Integral of the density
    fn integral(&self) -> f64;

    /// Mean of the density, assuming it is normalised
    fn average_value(&self) -> f64;

    /// Copy of the distribution whose density integrates to one
    fn normalise(&self) -> Result<Self>;

    fn linearise(&self, tolerance: &LinearisationTolerance) -> Result<TabulatedDistribution>;

    /// Draw a value from the distribution
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64>;
}

fn normalisation_factor(integral: f64, what: &str) -> Result<f64> {
    if integral == 0.0 || !integral.is_finite() {
        return Err(DistributionError::invalid_operation(format!(
            "cannot normalise {} with integral {}",
            what, integral
        )));
    }
    Ok(integral)
}

/// Tabulated density with an optional tabulated cumulative function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabulatedDistribution {
    pdf: TabulatedFunction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cdf: Option<TabulatedFunction>,
}

impl TabulatedDistribution {
    /// Distribution without a cumulative function
    pub fn new(pdf: TabulatedFunction) -> Self {
        TabulatedDistribution { pdf, cdf: None }
    }

    /// Distribution with an explicit cumulative function on the same domain
    pub fn with_cdf(pdf: TabulatedFunction, cdf: TabulatedFunction) -> Result<Self> {
        if pdf.domain() != cdf.domain() {
            return Err(DistributionError::invalid_input(format!(
                "density domain {:?} and cumulative domain {:?} differ",
                pdf.domain(),
                cdf.domain()
            )));
        }
        Ok(TabulatedDistribution {
            pdf,
            cdf: Some(cdf),
        })
    }

    /// Derive a density from a cumulative function by finite differences.
    ///
    /// Every interval of the cumulative function becomes a constant density
    /// described by two points, so neighbouring intervals meet in a
    /// discontinuity. Only a single linear-linear region is supported.
    pub fn from_cumulative(cdf: TabulatedFunction) -> Result<Self> {
        if cdf.number_regions() != 1 || !cdf.is_linearised() {
            return Err(DistributionError::unsupported(format!(
                "a density can only be derived from a single linear-linear cumulative function, got {:?}",
                cdf.interpolants()
            )));
        }

        let (xs, cs) = (cdf.x(), cdf.y());
        let mut x = Vec::with_capacity(2 * xs.len());
        let mut y = Vec::with_capacity(2 * xs.len());
        for i in 0..xs.len() - 1 {
            let width = xs[i + 1] - xs[i];
            if width == 0.0 {
                continue;
            }
            let density = (cs[i + 1] - cs[i]) / width;
            x.push(xs[i]);
            y.push(density);
            x.push(xs[i + 1]);
            y.push(density);
        }

        let pdf = TabulatedFunction::linear(x, y)?;
        Ok(TabulatedDistribution {
            pdf,
            cdf: Some(cdf),
        })
    }

    pub fn pdf(&self) -> &TabulatedFunction {
        &self.pdf
    }

    /// The cumulative function, if one was supplied
    pub fn cdf(&self) -> Result<&TabulatedFunction> {
        self.cdf
            .as_ref()
            .ok_or_else(|| DistributionError::not_available("no cumulative function was defined"))
    }

    pub fn has_cdf(&self) -> bool {
        self.cdf.is_some()
    }
}

impl Distribution for TabulatedDistribution {
    fn evaluate(&self, x: f64) -> f64 {
        self.pdf.evaluate(x)
    }

    fn domain(&self) -> (f64, f64) {
        self.pdf.domain()
    }

    fn integral(&self) -> f64 {
        self.pdf.integral()
    }

    fn average_value(&self) -> f64 {
        self.pdf.mean()
    }

    /// The density is divided by its integral and the cumulative function
    /// by its final value
    fn normalise(&self) -> Result<Self> {
        let integral = normalisation_factor(self.pdf.integral(), "a tabulated density")?;
        tracing::debug!(integral, "normalising tabulated distribution");
        let cdf = match &self.cdf {
            Some(cdf) => {
                let last = cdf.y()[cdf.number_points() - 1];
                Some(cdf / normalisation_factor(last, "a cumulative function")?)
            }
            None => None,
        };
        Ok(TabulatedDistribution {
            pdf: &self.pdf / integral,
            cdf,
        })
    }

    fn linearise(&self, tolerance: &LinearisationTolerance) -> Result<TabulatedDistribution> {
        let pdf = self.pdf.linearise(tolerance)?;
        let cdf = self
            .cdf
            .as_ref()
            .map(|cdf| cdf.linearise(tolerance))
            .transpose()?;
        Ok(TabulatedDistribution { pdf, cdf })
    }

    /// Inverse transform sampling on a linear-linear density
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        if !self.pdf.is_linearised() {
            return Err(DistributionError::invalid_operation(
                "sampling requires a linearised density",
            ));
        }
        let total = self.pdf.integral();
        if !(total > 0.0 && total.is_finite()) {
            return Err(DistributionError::invalid_operation(format!(
                "cannot sample a density with integral {}",
                total
            )));
        }

        let xi: f64 = rng.gen();
        let target = xi * total;
        let (xs, ps) = (self.pdf.x(), self.pdf.y());
        let mut cumulative = 0.0;
        for i in 0..xs.len() - 1 {
            let (x1, x2, p1, p2) = (xs[i], xs[i + 1], ps[i], ps[i + 1]);
            let width = x2 - x1;
            if width == 0.0 {
                continue;
            }
            let area = 0.5 * width * (p1 + p2);
            if cumulative + area < target {
                cumulative += area;
                continue;
            }

            // solve p1 t + m t^2 / 2 = r for the offset t into the interval
            let r = target - cumulative;
            let slope = (p2 - p1) / width;
            let t = if slope == 0.0 {
                if p1 == 0.0 {
                    0.0
                } else {
                    r / p1
                }
            } else {
                let discriminant = (p1 * p1 + 2.0 * slope * r).max(0.0);
                (discriminant.sqrt() - p1) / slope
            };
            return Ok((x1 + t).clamp(x1, x2));
        }
        Ok(self.pdf.upper())
    }
}

/// Legendre density with its analytic cumulative function.
///
/// The cumulative function is the primitive of the normalised density,
/// zero at -1, so it is always available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LegendreDistributionData")]
pub struct LegendreDistribution {
    pdf: LegendreSeries,
    cdf: LegendreSeries,
}

#[derive(Deserialize)]
struct LegendreDistributionData {
    pdf: LegendreSeries,
}

impl TryFrom<LegendreDistributionData> for LegendreDistribution {
    type Error = DistributionError;

    fn try_from(data: LegendreDistributionData) -> Result<Self> {
        LegendreDistribution::new(data.pdf)
    }
}

impl LegendreDistribution {
    /// Build the distribution, deriving the cumulative function.
    ///
    /// Fails when the density integrates to zero, since no cumulative
    /// probability can then be defined.
    pub fn new(pdf: LegendreSeries) -> Result<Self> {
        let integral = pdf.integral();
        if integral == 0.0 || !integral.is_finite() {
            return Err(DistributionError::invalid_input(format!(
                "a Legendre density must have a non-zero integral, got {}",
                integral
            )));
        }
        let cdf = (&pdf / integral).primitive(0.0);
        Ok(LegendreDistribution { pdf, cdf })
    }

    /// Distribution from Legendre coefficients of the density
    pub fn from_coefficients(coefficients: Vec<f64>) -> Result<Self> {
        Self::new(LegendreSeries::new(coefficients)?)
    }

    pub fn pdf(&self) -> &LegendreSeries {
        &self.pdf
    }

    pub fn cdf(&self) -> &LegendreSeries {
        &self.cdf
    }
}

impl Distribution for LegendreDistribution {
    fn evaluate(&self, x: f64) -> f64 {
        self.pdf.evaluate(x)
    }

    fn domain(&self) -> (f64, f64) {
        self.pdf.domain()
    }

    fn integral(&self) -> f64 {
        self.pdf.integral()
    }

    fn average_value(&self) -> f64 {
        if self.pdf.order() == 0 {
            0.0
        } else {
            self.pdf.mean()
        }
    }

    fn normalise(&self) -> Result<Self> {
        let integral = normalisation_factor(self.pdf.integral(), "a Legendre density")?;
        tracing::debug!(integral, "normalising Legendre distribution");
        LegendreDistribution::new(&self.pdf / integral)
    }

    fn linearise(&self, tolerance: &LinearisationTolerance) -> Result<TabulatedDistribution> {
        TabulatedDistribution::with_cdf(self.pdf.linearise(tolerance)?, self.cdf.linearise(tolerance)?)
    }

    /// Invert the analytic cumulative function
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        let xi: f64 = rng.gen();
        if let Some(&mu) = self.cdf.roots(xi).first() {
            return Ok(mu);
        }
        // rounding can leave the cumulative value at +1 just below one
        let total = self.cdf.evaluate(LegendreSeries::UPPER);
        if xi >= total && (xi - total).abs() <= 1e-12 {
            tracing::warn!(xi, total, "no root of the cumulative function, using the upper bound");
            return Ok(LegendreSeries::UPPER);
        }
        Err(DistributionError::invalid_operation(format!(
            "cumulative function never reaches {}, is the density negative?",
            xi
        )))
    }
}
