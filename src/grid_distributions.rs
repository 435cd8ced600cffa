// Distributions tabulated on an outer grid (usually incident energy)

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

use crate::distribution::{Distribution, TabulatedDistribution};
use crate::error::{DistributionError, Result};
use crate::grid::{InterpolationGrid, Location};
use crate::interpolation::InterpolationType;
use crate::linearise::LinearisationTolerance;
use crate::tabulated_function::TabulatedFunction;

/// A distribution for every point of an outer grid.
///
/// The outer grid follows the same rules as a [`TabulatedFunction`] grid,
/// except that it may never end in a discontinuity. Between two grid points
/// the two bracketing distributions are evaluated at the same inner value and
/// the results are interpolated (unit-base interpolation): the inner domains
/// are not rescaled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridDistributions<D: Distribution> {
    grid: InterpolationGrid,
    distributions: Vec<D>,
}

#[derive(Deserialize)]
struct GridDistributionsData<D> {
    grid: InterpolationGrid,
    distributions: Vec<D>,
}

impl<'de, D> Deserialize<'de> for GridDistributions<D>
where
    D: Distribution + Deserialize<'de>,
{
    fn deserialize<De>(deserializer: De) -> std::result::Result<Self, De::Error>
    where
        De: Deserializer<'de>,
    {
        let data = GridDistributionsData::<D>::deserialize(deserializer)?;
        GridDistributions::from_grid(data.grid, data.distributions).map_err(serde::de::Error::custom)
    }
}

impl<D: Distribution> GridDistributions<D> {
    /// # Arguments
    /// * `grid` - outer grid values, non-decreasing
    /// * `distributions` - one distribution per outer grid value
    /// * `boundaries` - index of the last point of each interpolation region
    /// * `interpolants` - law used between distributions in each region
    pub fn new(
        grid: Vec<f64>,
        distributions: Vec<D>,
        boundaries: Vec<usize>,
        interpolants: Vec<InterpolationType>,
    ) -> Result<Self> {
        let (grid, _) = InterpolationGrid::new(grid, boundaries, interpolants, false)?;
        Self::from_grid(grid, distributions)
    }

    /// Single linear-linear region over the whole outer grid
    pub fn linear(grid: Vec<f64>, distributions: Vec<D>) -> Result<Self> {
        Self::from_grid(InterpolationGrid::linear(grid)?, distributions)
    }

    fn from_grid(grid: InterpolationGrid, distributions: Vec<D>) -> Result<Self> {
        if grid.number_points() != distributions.len() {
            return Err(DistributionError::invalid_input(format!(
                "outer grid has {} points but {} distributions were given",
                grid.number_points(),
                distributions.len()
            )));
        }
        Ok(GridDistributions {
            grid,
            distributions,
        })
    }

    pub fn grid(&self) -> &[f64] {
        self.grid.x()
    }

    pub fn distributions(&self) -> &[D] {
        &self.distributions
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

    /// Density at `(outer, inner)`, zero outside the outer grid
    pub fn evaluate(&self, outer: f64, inner: f64) -> f64 {
        match self.grid.locate(outer) {
            Location::Outside => 0.0,
            Location::UpperBound => self.distributions[self.distributions.len() - 1].evaluate(inner),
            Location::Interval(i) => {
                let x = self.grid.x();
                let lower = self.distributions[i].evaluate(inner);
                let upper = self.distributions[i + 1].evaluate(inner);
                self.grid
                    .interpolant(i)
                    .interpolate(outer, x[i], x[i + 1], lower, upper)
            }
        }
    }

    fn map_distributions<T: Distribution>(&self, f: impl Fn(&D) -> Result<T>) -> Result<GridDistributions<T>> {
        let distributions = self.distributions.iter().map(f).collect::<Result<Vec<_>>>()?;
        Ok(GridDistributions {
            grid: self.grid.clone(),
            distributions,
        })
    }

    /// Normalise every distribution independently
    pub fn normalise(&self) -> Result<Self> {
        self.map_distributions(|d| d.normalise())
    }

    /// Linearise every distribution, keeping the outer grid and regions
    pub fn linearise(
        &self,
        tolerance: &LinearisationTolerance,
    ) -> Result<GridDistributions<TabulatedDistribution>> {
        self.map_distributions(|d| d.linearise(tolerance))
    }

    /// Average value of every distribution as a function of the outer variable
    pub fn average_values(&self) -> Result<TabulatedFunction> {
        let averages = self.distributions.iter().map(|d| d.average_value()).collect();
        TabulatedFunction::new(
            self.grid.x().to_vec(),
            averages,
            self.grid.boundaries().to_vec(),
            self.grid.interpolants().to_vec(),
        )
    }

    /// Sample the inner variable at `outer`.
    ///
    /// Values beyond the outer grid use the nearest distribution. Inside an
    /// interval the upper distribution is chosen with a probability equal to
    /// the interpolation fraction.
    pub fn sample<R: Rng + ?Sized>(&self, outer: f64, rng: &mut R) -> Result<f64> {
        let last = self.distributions.len() - 1;
        let index = match self.grid.locate(outer) {
            Location::Outside if outer < self.lower() => 0,
            Location::Outside | Location::UpperBound => last,
            Location::Interval(i) => {
                let x = self.grid.x();
                let fraction = match self.grid.interpolant(i) {
                    InterpolationType::LinearLog | InterpolationType::LogLog => {
                        (outer / x[i]).ln() / (x[i + 1] / x[i]).ln()
                    }
                    _ => (outer - x[i]) / (x[i + 1] - x[i]),
                };
                if rng.gen::<f64>() < fraction {
                    i + 1
                } else {
                    i
                }
            }
        };
        self.distributions[index].sample(rng)
    }
}
