// Tabulated functions made of interpolation regions

use serde::{Deserialize, Serialize};
use std::ops::{Div, Mul, Neg};

use crate::error::{DistributionError, Result};
use crate::grid::{InterpolationGrid, Location};
use crate::interpolation::InterpolationType;
use crate::linearise::{linearise_interval, LinearisationTolerance};

/// A tabulated function y(x) made of interpolation regions.
///
/// Values outside `[x_min, x_max]` are zero. Two adjacent equal abscissae
/// describe a discontinuity; at such a point the value of the interval
/// starting there is used, except at the upper bound of the table.
///
/// Every operation returns a new table, the receiver is never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TabulatedFunctionData", into = "TabulatedFunctionData")]
pub struct TabulatedFunction {
    grid: InterpolationGrid,
    y: Vec<f64>,
}

/// Flat serialised layout, validated on the way in
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TabulatedFunctionData {
    x: Vec<f64>,
    y: Vec<f64>,
    boundaries: Vec<usize>,
    interpolants: Vec<InterpolationType>,
}

impl TryFrom<TabulatedFunctionData> for TabulatedFunction {
    type Error = DistributionError;

    fn try_from(data: TabulatedFunctionData) -> Result<Self> {
        TabulatedFunction::new(data.x, data.y, data.boundaries, data.interpolants)
    }
}

impl From<TabulatedFunction> for TabulatedFunctionData {
    fn from(function: TabulatedFunction) -> Self {
        TabulatedFunctionData {
            x: function.grid.x().to_vec(),
            boundaries: function.grid.boundaries().to_vec(),
            interpolants: function.grid.interpolants().to_vec(),
            y: function.y,
        }
    }
}

impl TabulatedFunction {
    /// Build a table from its grid, values and interpolation regions.
    ///
    /// # Arguments
    /// * `x` - abscissae, non-decreasing, at most two equal in a row
    /// * `y` - values, one per abscissa
    /// * `boundaries` - index of the last point of each region
    /// * `interpolants` - interpolation law of each region
    ///
    /// A discontinuity on the last pair is dropped when the final value is
    /// zero; a boundary naming the second point of a discontinuity is moved
    /// to the first.
    pub fn new(
        x: Vec<f64>,
        mut y: Vec<f64>,
        boundaries: Vec<usize>,
        interpolants: Vec<InterpolationType>,
    ) -> Result<Self> {
        if x.len() != y.len() {
            return Err(DistributionError::invalid_input(format!(
                "x and y have different lengths ({} and {})",
                x.len(),
                y.len()
            )));
        }
        if let Some(value) = y.iter().find(|v| !v.is_finite()) {
            return Err(DistributionError::invalid_input(format!(
                "values contain a non-finite entry: {}",
                value
            )));
        }

        let trailing_zero = y.last() == Some(&0.0);
        let (grid, trimmed) = InterpolationGrid::new(x, boundaries, interpolants, trailing_zero)?;
        if trimmed {
            tracing::warn!(
                x = grid.upper(),
                "dropped the last point of a trailing discontinuity to zero"
            );
            y.pop();
        }
        Ok(TabulatedFunction { grid, y })
    }

    /// Table with a single linear-linear region
    pub fn linear(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        let last = x.len().saturating_sub(1);
        Self::new(x, y, vec![last], vec![InterpolationType::LinearLinear])
    }

    /// Build a table from ENDF style interpolation data.
    ///
    /// `breakpoints` are one-based indices of the last point of each region
    /// (NBT) and `interpolation` the matching ENDF codes (INT). Empty
    /// breakpoint data means a single linear-linear region.
    pub fn from_endf(
        x: Vec<f64>,
        y: Vec<f64>,
        breakpoints: &[i32],
        interpolation: &[i32],
    ) -> Result<Self> {
        if breakpoints.is_empty() && interpolation.is_empty() {
            return Self::linear(x, y);
        }
        let boundaries = breakpoints
            .iter()
            .map(|&nbt| {
                if nbt < 1 {
                    Err(DistributionError::invalid_input(format!(
                        "ENDF breakpoints are one-based, got {}",
                        nbt
                    )))
                } else {
                    Ok(nbt as usize - 1)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        let interpolants = interpolation
            .iter()
            .map(|&code| InterpolationType::from_endf(code))
            .collect::<Result<Vec<_>>>()?;
        Self::new(x, y, boundaries, interpolants)
    }

    pub fn x(&self) -> &[f64] {
        self.grid.x()
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn boundaries(&self) -> &[usize] {
        self.grid.boundaries()
    }

    pub fn interpolants(&self) -> &[InterpolationType] {
        self.grid.interpolants()
    }

    pub fn number_points(&self) -> usize {
        self.grid.number_points()
    }

    pub fn number_regions(&self) -> usize {
        self.grid.number_regions()
    }

    pub fn lower(&self) -> f64 {
        self.grid.lower()
    }

    pub fn upper(&self) -> f64 {
        self.grid.upper()
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.lower(), self.upper())
    }

    pub fn is_linearised(&self) -> bool {
        self.grid.is_linearised()
    }

    /// Evaluate the table at `x`, zero outside the domain
    pub fn evaluate(&self, x: f64) -> f64 {
        match self.grid.locate(x) {
            Location::Outside => 0.0,
            Location::UpperBound => self.y[self.y.len() - 1],
            Location::Interval(i) => {
                let xs = self.grid.x();
                self.grid
                    .interpolant(i)
                    .interpolate(x, xs[i], xs[i + 1], self.y[i], self.y[i + 1])
            }
        }
    }

    /// Integral over the whole domain
    pub fn integral(&self) -> f64 {
        let xs = self.grid.x();
        self.grid
            .intervals()
            .map(|(i, law)| law.integral(xs[i], xs[i + 1], self.y[i], self.y[i + 1]))
            .sum()
    }

    /// First moment, the integral of x * y(x).
    ///
    /// This is not divided by the integral: normalise first to get a mean.
    pub fn mean(&self) -> f64 {
        let xs = self.grid.x();
        self.grid
            .intervals()
            .map(|(i, law)| law.first_moment(xs[i], xs[i + 1], self.y[i], self.y[i + 1]))
            .sum()
    }

    /// Replace every non linear-linear interval by a refined set of chords.
    ///
    /// Discontinuities are kept and each one closes a linear-linear region,
    /// so linearising a linearised table gives the same table back.
    pub fn linearise(&self, tolerance: &LinearisationTolerance) -> Result<Self> {
        let xs = self.grid.x();
        let ys = &self.y;

        let mut x = vec![xs[0]];
        let mut y = vec![ys[0]];
        let mut boundaries = Vec::new();

        for (i, law) in self.grid.intervals() {
            if xs[i] == xs[i + 1] {
                boundaries.push(x.len() - 1);
                x.push(xs[i + 1]);
                y.push(ys[i + 1]);
                continue;
            }
            if law.is_linear() {
                x.push(xs[i + 1]);
                y.push(ys[i + 1]);
                continue;
            }

            let (x1, x2, y1, y2) = (xs[i], xs[i + 1], ys[i], ys[i + 1]);
            let exact = |v: f64| law.interpolate(v, x1, x2, y1, y2);
            for (px, py) in linearise_interval(&exact, (x1, y1), (x2, y2), tolerance)? {
                x.push(px);
                y.push(py);
            }
        }
        boundaries.push(x.len() - 1);

        tracing::debug!(
            before = self.number_points(),
            after = x.len(),
            "linearised tabulated function"
        );
        let interpolants = vec![InterpolationType::LinearLinear; boundaries.len()];
        Self::new(x, y, boundaries, interpolants)
    }

    /// Same grid and regions with new values
    fn with_values(&self, y: Vec<f64>) -> Self {
        TabulatedFunction {
            grid: self.grid.clone(),
            y,
        }
    }

    fn require_linearised(&self, operation: &str) -> Result<()> {
        if self.is_linearised() {
            Ok(())
        } else {
            Err(DistributionError::invalid_operation(format!(
                "{} requires a table with only linear-linear regions, found {:?}",
                operation,
                self.interpolants()
            )))
        }
    }

    /// Add a constant, only defined for linear-linear tables
    pub fn add_scalar(&self, value: f64) -> Result<Self> {
        self.require_linearised("adding a scalar")?;
        Ok(self.with_values(self.y.iter().map(|y| y + value).collect()))
    }

    pub fn subtract_scalar(&self, value: f64) -> Result<Self> {
        self.require_linearised("subtracting a scalar")?;
        Ok(self.with_values(self.y.iter().map(|y| y - value).collect()))
    }

    pub fn scale(&self, factor: f64) -> Self {
        self.with_values(self.y.iter().map(|y| y * factor).collect())
    }

    /// Pointwise sum of two linear-linear tables
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.combine(other, 1.0, "adding tables")
    }

    /// Pointwise difference of two linear-linear tables
    pub fn subtract(&self, other: &Self) -> Result<Self> {
        self.combine(other, -1.0, "subtracting tables")
    }

    /// Left and right limits at `x`, treating the table as zero outside
    /// its own domain
    fn limits(&self, x: f64) -> (f64, f64) {
        if !(x >= self.lower() && x <= self.upper()) {
            return (0.0, 0.0);
        }
        if let Some(j) = self.grid.jump_at(x) {
            return (self.y[j], self.y[j + 1]);
        }
        if x == self.lower() {
            return (0.0, self.y[0]);
        }
        if x == self.upper() {
            return (self.y[self.y.len() - 1], 0.0);
        }
        let value = self.evaluate(x);
        (value, value)
    }

    /// Whether the zero-extended table may be discontinuous at `x`
    fn has_step_at(&self, x: f64) -> bool {
        x == self.lower() || x == self.upper() || self.grid.jump_at(x).is_some()
    }

    fn combine(&self, other: &Self, sign: f64, operation: &str) -> Result<Self> {
        self.require_linearised(operation)?;
        other.require_linearised(operation)?;

        let lower = self.lower().min(other.lower());
        let upper = self.upper().max(other.upper());

        let mut abscissae: Vec<f64> = self.x().iter().chain(other.x()).copied().collect();
        abscissae.sort_by(|a, b| a.total_cmp(b));
        abscissae.dedup();

        let mut x = Vec::with_capacity(abscissae.len() + 4);
        let mut y = Vec::with_capacity(abscissae.len() + 4);
        for value in abscissae {
            let (left_a, right_a) = self.limits(value);
            let (left_b, right_b) = other.limits(value);
            let left = left_a + sign * left_b;
            let right = right_a + sign * right_b;

            let inside = value > lower && value < upper;
            if inside && (self.has_step_at(value) || other.has_step_at(value)) {
                x.push(value);
                y.push(left);
                x.push(value);
                y.push(right);
            } else if value == upper {
                x.push(value);
                y.push(left);
            } else {
                x.push(value);
                y.push(right);
            }
        }
        Self::linear(x, y)
    }
}

impl Mul<f64> for &TabulatedFunction {
    type Output = TabulatedFunction;

    fn mul(self, factor: f64) -> TabulatedFunction {
        self.scale(factor)
    }
}

impl Mul<f64> for TabulatedFunction {
    type Output = TabulatedFunction;

    fn mul(mut self, factor: f64) -> TabulatedFunction {
        self.y.iter_mut().for_each(|y| *y *= factor);
        self
    }
}

impl Div<f64> for &TabulatedFunction {
    type Output = TabulatedFunction;

    fn div(self, divisor: f64) -> TabulatedFunction {
        self.with_values(self.y.iter().map(|y| y / divisor).collect())
    }
}

impl Div<f64> for TabulatedFunction {
    type Output = TabulatedFunction;

    fn div(mut self, divisor: f64) -> TabulatedFunction {
        self.y.iter_mut().for_each(|y| *y /= divisor);
        self
    }
}

impl Neg for &TabulatedFunction {
    type Output = TabulatedFunction;

    fn neg(self) -> TabulatedFunction {
        self.scale(-1.0)
    }
}

impl Neg for TabulatedFunction {
    type Output = TabulatedFunction;

    fn neg(self) -> TabulatedFunction {
        self * -1.0
    }
}
