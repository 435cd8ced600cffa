// Legendre polynomial expansions on the fixed domain [-1, 1]

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::error::{DistributionError, Result};
use crate::linearise::{linearise_interval, LinearisationTolerance};
use crate::tabulated_function::TabulatedFunction;

/// Bisection steps used to polish a bracketed root
const ROOT_ITERATIONS: usize = 200;

/// A Legendre series f(x) = sum_l c_l P_l(x) on [-1, 1].
///
/// The coefficient at index `l` multiplies the Legendre polynomial of order
/// `l`. Like a tabulated function the series is zero outside its domain, but
/// it is always smooth so all algebra is allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LegendreSeriesData")]
pub struct LegendreSeries {
    coefficients: Vec<f64>,
}

#[derive(Deserialize)]
struct LegendreSeriesData {
    coefficients: Vec<f64>,
}

impl TryFrom<LegendreSeriesData> for LegendreSeries {
    type Error = DistributionError;

    fn try_from(data: LegendreSeriesData) -> Result<Self> {
        LegendreSeries::new(data.coefficients)
    }
}

impl LegendreSeries {
    pub const LOWER: f64 = -1.0;
    pub const UPPER: f64 = 1.0;

    pub fn new(coefficients: Vec<f64>) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(DistributionError::invalid_input(
                "a Legendre series needs at least one coefficient",
            ));
        }
        if let Some(value) = coefficients.iter().find(|c| !c.is_finite()) {
            return Err(DistributionError::invalid_input(format!(
                "Legendre coefficients must be finite, got {}",
                value
            )));
        }
        Ok(LegendreSeries { coefficients })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Highest polynomial order in the expansion
    pub fn order(&self) -> usize {
        self.coefficients.len() - 1
    }

    pub fn lower(&self) -> f64 {
        Self::LOWER
    }

    pub fn upper(&self) -> f64 {
        Self::UPPER
    }

    pub fn domain(&self) -> (f64, f64) {
        (Self::LOWER, Self::UPPER)
    }

    /// Evaluate the series using the Bonnet recurrence, zero outside [-1, 1]
    pub fn evaluate(&self, x: f64) -> f64 {
        if !(x >= Self::LOWER && x <= Self::UPPER) {
            return 0.0;
        }
        let c = &self.coefficients;
        let mut sum = c[0];
        if c.len() == 1 {
            return sum;
        }

        // (l + 1) P_{l+1} = (2l + 1) x P_l - l P_{l-1}
        let mut p_previous = 1.0;
        let mut p = x;
        sum += c[1] * p;
        for (l, &coefficient) in c.iter().enumerate().skip(2) {
            let k = (l - 1) as f64;
            let p_next = ((2.0 * k + 1.0) * x * p - k * p_previous) / (k + 1.0);
            p_previous = p;
            p = p_next;
            sum += coefficient * p;
        }
        sum
    }

    /// Integral over [-1, 1]; only P_0 contributes
    pub fn integral(&self) -> f64 {
        2.0 * self.coefficients[0]
    }

    /// First moment over [-1, 1]; only P_1 contributes.
    ///
    /// A series of order zero has no directional dependence, its mean is 0.
    pub fn mean(&self) -> f64 {
        match self.coefficients.get(1) {
            Some(&c1) => 2.0 * c1 / 3.0,
            None => 0.0,
        }
    }

    /// Series of the derivative, one order lower (a constant stays a zero constant)
    pub fn derivative(&self) -> Self {
        let c = &self.coefficients;
        let n = c.len();
        if n == 1 {
            return LegendreSeries {
                coefficients: vec![0.0],
            };
        }
        // P_l' = sum over k = l-1, l-3, ... of (2k + 1) P_k
        let mut derivative = vec![0.0; n - 1];
        for (k, d) in derivative.iter_mut().enumerate() {
            let sum: f64 = (k + 1..n).step_by(2).map(|l| c[l]).sum();
            *d = (2 * k + 1) as f64 * sum;
        }
        LegendreSeries {
            coefficients: derivative,
        }
    }

    /// Series of the antiderivative, one order higher, equal to `left` at x = -1
    pub fn primitive(&self, left: f64) -> Self {
        let c = &self.coefficients;
        let mut primitive = vec![0.0; c.len() + 1];
        // integral of P_0 is P_1, integral of P_l is (P_{l+1} - P_{l-1}) / (2l + 1)
        primitive[1] += c[0];
        for (l, &coefficient) in c.iter().enumerate().skip(1) {
            let scale = coefficient / (2 * l + 1) as f64;
            primitive[l + 1] += scale;
            primitive[l - 1] -= scale;
        }
        // P_l(-1) = (-1)^l
        let at_lower: f64 = primitive
            .iter()
            .enumerate()
            .map(|(l, &a)| if l % 2 == 0 { a } else { -a })
            .sum();
        primitive[0] += left - at_lower;
        LegendreSeries {
            coefficients: primitive,
        }
    }

    /// Points in [-1, 1] where the series equals `value`, sorted and distinct
    pub fn roots(&self, value: f64) -> Vec<f64> {
        let mut shifted = self.coefficients.clone();
        shifted[0] -= value;
        LegendreSeries {
            coefficients: shifted,
        }
        .zeros()
    }

    /// Same series without trailing zero coefficients
    fn trimmed(&self) -> Self {
        let last = self
            .coefficients
            .iter()
            .rposition(|&c| c != 0.0)
            .unwrap_or(0);
        LegendreSeries {
            coefficients: self.coefficients[..=last].to_vec(),
        }
    }

    // The zeros of the derivative split the domain into monotonic pieces,
    // each holding at most one zero of the series itself.
    fn zeros(&self) -> Vec<f64> {
        let series = self.trimmed();
        let c = &series.coefficients;
        if c.len() == 1 {
            return Vec::new();
        }
        if c.len() == 2 {
            let root = -c[0] / c[1];
            return if (Self::LOWER..=Self::UPPER).contains(&root) {
                vec![root]
            } else {
                Vec::new()
            };
        }

        let critical = series.derivative().zeros();
        let scale = c.iter().map(|v| v.abs()).sum::<f64>();

        let mut knots = vec![Self::LOWER];
        knots.extend(
            critical
                .iter()
                .copied()
                .filter(|&x| x > Self::LOWER && x < Self::UPPER),
        );
        knots.push(Self::UPPER);

        let mut roots = Vec::new();
        for window in knots.windows(2) {
            let (a, b) = (window[0], window[1]);
            let (fa, fb) = (series.evaluate(a), series.evaluate(b));
            if fa == 0.0 {
                roots.push(a);
            } else if fa * fb < 0.0 {
                roots.push(series.bisect(a, b, fa));
            }
        }
        if series.evaluate(Self::UPPER) == 0.0 {
            roots.push(Self::UPPER);
        }
        // zeros of even multiplicity touch the axis at an extremum
        for &x in &critical {
            if series.evaluate(x).abs() <= 1e-12 * scale {
                roots.push(x);
            }
        }

        roots.sort_by(|a, b| a.total_cmp(b));
        roots.dedup_by(|a, b| (*a - *b).abs() <= 1e-12);
        roots
    }

    fn bisect(&self, mut a: f64, mut b: f64, mut fa: f64) -> f64 {
        for _ in 0..ROOT_ITERATIONS {
            let mid = 0.5 * (a + b);
            if !(mid > a && mid < b) {
                break;
            }
            let fm = self.evaluate(mid);
            if fm == 0.0 {
                return mid;
            }
            if fa * fm < 0.0 {
                b = mid;
            } else {
                a = mid;
                fa = fm;
            }
        }
        0.5 * (a + b)
    }

    /// Piecewise linear approximation of the series over [-1, 1].
    ///
    /// The bisection starts from the domain bounds and every zero of the
    /// series, of its derivative and of its second derivative strictly inside
    /// the domain. Between two seeds the series is monotonic and keeps one
    /// curvature, so a chord matching it at the midpoint stays close to it.
    pub fn linearise(&self, tolerance: &LinearisationTolerance) -> Result<TabulatedFunction> {
        let first = self.derivative();
        let second = first.derivative();

        let mut interior: Vec<f64> = self
            .roots(0.0)
            .into_iter()
            .chain(first.roots(0.0))
            .chain(second.roots(0.0))
            .filter(|&x| x > Self::LOWER && x < Self::UPPER)
            .collect();
        interior.sort_by(|a, b| a.total_cmp(b));
        interior.dedup();

        let mut seeds = vec![Self::LOWER];
        seeds.extend(interior);
        seeds.push(Self::UPPER);

        let exact = |x: f64| self.evaluate(x);
        let mut x = vec![Self::LOWER];
        let mut y = vec![self.evaluate(Self::LOWER)];
        for window in seeds.windows(2) {
            let start = (window[0], self.evaluate(window[0]));
            let end = (window[1], self.evaluate(window[1]));
            for (px, py) in linearise_interval(&exact, start, end, tolerance)? {
                x.push(px);
                y.push(py);
            }
        }

        tracing::debug!(order = self.order(), points = x.len(), "linearised Legendre series");
        TabulatedFunction::linear(x, y)
    }

    pub fn add_scalar(&self, value: f64) -> Self {
        self + value
    }

    pub fn subtract_scalar(&self, value: f64) -> Self {
        self - value
    }

    /// Coefficient-wise sum, the shorter series is padded with zeros
    pub fn add(&self, other: &Self) -> Self {
        self + other
    }

    pub fn subtract(&self, other: &Self) -> Self {
        self - other
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        LegendreSeries {
            coefficients: self.coefficients.iter().map(|&c| f(c)).collect(),
        }
    }

    fn zip(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let n = self.coefficients.len().max(other.coefficients.len());
        let coefficients = (0..n)
            .map(|l| {
                let a = self.coefficients.get(l).copied().unwrap_or(0.0);
                let b = other.coefficients.get(l).copied().unwrap_or(0.0);
                f(a, b)
            })
            .collect();
        LegendreSeries { coefficients }
    }
}

impl Add<&LegendreSeries> for &LegendreSeries {
    type Output = LegendreSeries;

    fn add(self, other: &LegendreSeries) -> LegendreSeries {
        self.zip(other, |a, b| a + b)
    }
}

impl Sub<&LegendreSeries> for &LegendreSeries {
    type Output = LegendreSeries;

    fn sub(self, other: &LegendreSeries) -> LegendreSeries {
        self.zip(other, |a, b| a - b)
    }
}

impl Add<f64> for &LegendreSeries {
    type Output = LegendreSeries;

    fn add(self, value: f64) -> LegendreSeries {
        let mut result = self.clone();
        result.coefficients[0] += value;
        result
    }
}

impl Sub<f64> for &LegendreSeries {
    type Output = LegendreSeries;

    fn sub(self, value: f64) -> LegendreSeries {
        self + (-value)
    }
}

impl Mul<f64> for &LegendreSeries {
    type Output = LegendreSeries;

    fn mul(self, factor: f64) -> LegendreSeries {
        self.map(|c| c * factor)
    }
}

impl Div<f64> for &LegendreSeries {
    type Output = LegendreSeries;

    fn div(self, divisor: f64) -> LegendreSeries {
        self.map(|c| c / divisor)
    }
}

impl Neg for &LegendreSeries {
    type Output = LegendreSeries;

    fn neg(self) -> LegendreSeries {
        self.map(|c| -c)
    }
}
