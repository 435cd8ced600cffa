// Grid of abscissae partitioned into interpolation regions
//
// Shared by TabulatedFunction (scalar values) and GridDistributions (whole
// distributions as values), so both follow the same discontinuity rules.

use serde::{Deserialize, Serialize};

use crate::error::{DistributionError, Result};
use crate::interpolation::InterpolationType;

/// Ordered abscissae with their interpolation regions.
///
/// `boundaries[r]` is the index of the last grid point of region `r` and
/// `interpolants[r]` the law used inside it. Two adjacent equal abscissae
/// form a jump; a boundary never names the second point of a jump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InterpolationGridData")]
pub struct InterpolationGrid {
    x: Vec<f64>,
    boundaries: Vec<usize>,
    interpolants: Vec<InterpolationType>,
}

/// Where an abscissa falls relative to a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    Outside,
    /// Exactly the last grid point
    UpperBound,
    /// Inside `[x[i], x[i+1])`, never a zero-width interval
    Interval(usize),
}

#[derive(Deserialize)]
struct InterpolationGridData {
    x: Vec<f64>,
    boundaries: Vec<usize>,
    interpolants: Vec<InterpolationType>,
}

impl TryFrom<InterpolationGridData> for InterpolationGrid {
    type Error = DistributionError;

    fn try_from(data: InterpolationGridData) -> Result<Self> {
        let (grid, _) = InterpolationGrid::new(data.x, data.boundaries, data.interpolants, false)?;
        Ok(grid)
    }
}

impl InterpolationGrid {
    /// Validate and canonicalise a grid.
    ///
    /// A jump on the very last pair is removed when `trim_trailing_jump` is
    /// set (the caller knows the final value is zero) and rejected otherwise.
    /// The returned flag tells the caller whether the last point was dropped.
    pub(crate) fn new(
        mut x: Vec<f64>,
        mut boundaries: Vec<usize>,
        mut interpolants: Vec<InterpolationType>,
        trim_trailing_jump: bool,
    ) -> Result<(Self, bool)> {
        let n = x.len();
        if n < 2 {
            return Err(DistributionError::invalid_input(format!(
                "at least two grid points are required, got {}",
                n
            )));
        }
        if boundaries.is_empty() {
            return Err(DistributionError::invalid_input(
                "at least one interpolation region is required",
            ));
        }
        if boundaries.len() != interpolants.len() {
            return Err(DistributionError::invalid_input(format!(
                "number of boundaries ({}) and interpolation types ({}) differ",
                boundaries.len(),
                interpolants.len()
            )));
        }
        if boundaries[boundaries.len() - 1] != n - 1 {
            return Err(DistributionError::invalid_input(format!(
                "last boundary ({}) must be the index of the last grid point ({})",
                boundaries[boundaries.len() - 1],
                n - 1
            )));
        }
        if let Some(value) = x.iter().find(|v| !v.is_finite()) {
            return Err(DistributionError::invalid_input(format!(
                "grid contains a non-finite value: {}",
                value
            )));
        }
        for i in 1..n {
            if x[i] < x[i - 1] {
                return Err(DistributionError::invalid_input(format!(
                    "grid is not sorted: x[{}] = {} follows x[{}] = {}",
                    i,
                    x[i],
                    i - 1,
                    x[i - 1]
                )));
            }
        }
        for i in 2..n {
            if x[i] == x[i - 1] && x[i] == x[i - 2] {
                return Err(DistributionError::invalid_input(format!(
                    "grid value {} appears more than twice",
                    x[i]
                )));
            }
        }
        if x[0] == x[1] {
            return Err(DistributionError::invalid_input(format!(
                "grid cannot start with a discontinuity (x = {})",
                x[0]
            )));
        }

        let mut trimmed = false;
        if x[n - 1] == x[n - 2] {
            if !trim_trailing_jump {
                return Err(DistributionError::invalid_input(format!(
                    "grid cannot end with a discontinuity unless the final value is zero (x = {})",
                    x[n - 1]
                )));
            }
            x.pop();
            let last = boundaries.len() - 1;
            boundaries[last] = n - 2;
            trimmed = true;
        }

        for boundary in boundaries.iter_mut() {
            if *boundary > 0 && *boundary < x.len() && x[*boundary] == x[*boundary - 1] {
                *boundary -= 1;
            }
        }

        // trimming can leave a final region with no interval at all
        if trimmed && boundaries.len() > 1 {
            let last = boundaries.len() - 1;
            if boundaries[last] == boundaries[last - 1] {
                boundaries.pop();
                interpolants.pop();
            }
        }

        if boundaries[0] == 0 {
            return Err(DistributionError::invalid_input(
                "the first region must contain at least one interval",
            ));
        }
        for r in 1..boundaries.len() {
            if boundaries[r] <= boundaries[r - 1] {
                return Err(DistributionError::invalid_input(format!(
                    "boundaries must be strictly increasing: {:?}",
                    boundaries
                )));
            }
        }

        Ok((
            InterpolationGrid {
                x,
                boundaries,
                interpolants,
            },
            trimmed,
        ))
    }

    /// Grid with a single linear-linear region over all points
    pub(crate) fn linear(x: Vec<f64>) -> Result<Self> {
        let last = x.len().saturating_sub(1);
        let (grid, _) = Self::new(x, vec![last], vec![InterpolationType::LinearLinear], false)?;
        Ok(grid)
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    pub fn interpolants(&self) -> &[InterpolationType] {
        &self.interpolants
    }

    pub fn number_points(&self) -> usize {
        self.x.len()
    }

    pub fn number_regions(&self) -> usize {
        self.boundaries.len()
    }

    pub fn lower(&self) -> f64 {
        self.x[0]
    }

    pub fn upper(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    /// True when every region is linear-linear
    pub fn is_linearised(&self) -> bool {
        self.interpolants.iter().all(|law| law.is_linear())
    }

    /// Locate `value` using the right-continuous convention at jumps
    pub(crate) fn locate(&self, value: f64) -> Location {
        if !(value >= self.lower() && value <= self.upper()) {
            return Location::Outside;
        }
        if value == self.upper() {
            return Location::UpperBound;
        }
        // last index with x[i] <= value
        let i = self.x.partition_point(|&v| v <= value) - 1;
        Location::Interval(i)
    }

    /// Interpolation law governing the interval `[x[i], x[i+1]]`
    pub(crate) fn interpolant(&self, interval: usize) -> InterpolationType {
        let region = self.boundaries.partition_point(|&b| b <= interval);
        self.interpolants[region.min(self.interpolants.len() - 1)]
    }

    /// Every interval with the law governing it, in grid order
    pub(crate) fn intervals(&self) -> impl Iterator<Item = (usize, InterpolationType)> + '_ {
        let mut start = 0;
        self.boundaries
            .iter()
            .zip(self.interpolants.iter())
            .flat_map(move |(&end, &law)| {
                let range = start..end;
                start = end;
                range.map(move |i| (i, law))
            })
    }

    /// Whether the grid has a jump at `value`, returning the index of its first point
    pub(crate) fn jump_at(&self, value: f64) -> Option<usize> {
        let j = self.x.partition_point(|&v| v < value);
        if j + 1 < self.x.len() && self.x[j] == value && self.x[j + 1] == value {
            Some(j)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::InterpolationType::{LinearLinear, LogLog};

    fn grid(x: Vec<f64>, boundaries: Vec<usize>, laws: Vec<InterpolationType>) -> Result<InterpolationGrid> {
        InterpolationGrid::new(x, boundaries, laws, false).map(|(g, _)| g)
    }

    #[test]
    fn test_valid_grid() {
        let g = grid(vec![1.0, 2.0, 3.0, 4.0], vec![1, 3], vec![LogLog, LinearLinear]).unwrap();
        assert_eq!(g.number_points(), 4);
        assert_eq!(g.number_regions(), 2);
        assert_eq!(g.lower(), 1.0);
        assert_eq!(g.upper(), 4.0);
        assert!(!g.is_linearised());
        assert_eq!(g.interpolant(0), LogLog);
        assert_eq!(g.interpolant(1), LinearLinear);
        assert_eq!(g.interpolant(2), LinearLinear);
    }

    #[test]
    fn test_invalid_grids() {
        let err = |r: Result<InterpolationGrid>| matches!(r, Err(DistributionError::InvalidInput(_)));
        // too few points
        assert!(err(grid(vec![1.0], vec![0], vec![LinearLinear])));
        // unsorted
        assert!(err(grid(vec![1.0, 3.0, 2.0], vec![2], vec![LinearLinear])));
        // triple point
        assert!(err(grid(vec![1.0, 2.0, 2.0, 2.0, 3.0], vec![4], vec![LinearLinear])));
        // boundary / law count mismatch
        assert!(err(grid(vec![1.0, 2.0, 3.0], vec![1, 2], vec![LinearLinear])));
        // last boundary is not the last index
        assert!(err(grid(vec![1.0, 2.0, 3.0], vec![1], vec![LinearLinear])));
        // leading jump
        assert!(err(grid(vec![1.0, 1.0, 3.0], vec![2], vec![LinearLinear])));
        // trailing jump without trimming
        assert!(err(grid(vec![1.0, 2.0, 2.0], vec![2], vec![LinearLinear])));
        // non-increasing boundaries
        assert!(err(grid(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2, 3], vec![LinearLinear; 3])));
        // NaN
        assert!(err(grid(vec![1.0, f64::NAN, 3.0], vec![2], vec![LinearLinear])));
    }

    #[test]
    fn test_boundary_on_jump_is_canonicalised() {
        let a = grid(vec![1.0, 2.0, 2.0, 3.0], vec![2, 3], vec![LogLog, LinearLinear]).unwrap();
        let b = grid(vec![1.0, 2.0, 2.0, 3.0], vec![1, 3], vec![LogLog, LinearLinear]).unwrap();
        assert_eq!(a.boundaries(), &[1, 3]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_trailing_jump_trimmed() {
        let (g, trimmed) =
            InterpolationGrid::new(vec![1.0, 2.0, 3.0, 3.0], vec![3], vec![LinearLinear], true).unwrap();
        assert!(trimmed);
        assert_eq!(g.x(), &[1.0, 2.0, 3.0]);
        assert_eq!(g.boundaries(), &[2]);
    }

    #[test]
    fn test_trailing_jump_trim_drops_empty_region() {
        let (g, trimmed) = InterpolationGrid::new(
            vec![1.0, 2.0, 3.0, 3.0],
            vec![2, 3],
            vec![LogLog, LinearLinear],
            true,
        )
        .unwrap();
        assert!(trimmed);
        assert_eq!(g.boundaries(), &[2]);
        assert_eq!(g.interpolants(), &[LogLog]);
    }

    #[test]
    fn test_locate_right_continuous() {
        let g = grid(vec![-1.0, 0.0, 0.0, 0.5, 1.0], vec![4], vec![LinearLinear]).unwrap();
        assert_eq!(g.locate(-2.0), Location::Outside);
        assert_eq!(g.locate(1.5), Location::Outside);
        assert_eq!(g.locate(f64::NAN), Location::Outside);
        assert_eq!(g.locate(-1.0), Location::Interval(0));
        assert_eq!(g.locate(-0.5), Location::Interval(0));
        // at the jump the interval starting at the second point is used
        assert_eq!(g.locate(0.0), Location::Interval(2));
        assert_eq!(g.locate(0.75), Location::Interval(3));
        assert_eq!(g.locate(1.0), Location::UpperBound);
    }

    #[test]
    fn test_intervals_follow_regions() {
        let g = grid(vec![1.0, 2.0, 3.0, 4.0], vec![1, 3], vec![LogLog, LinearLinear]).unwrap();
        let intervals: Vec<_> = g.intervals().collect();
        assert_eq!(intervals, vec![(0, LogLog), (1, LinearLinear), (2, LinearLinear)]);
    }

    #[test]
    fn test_jump_at() {
        let g = grid(vec![-1.0, 0.0, 0.0, 0.5, 1.0], vec![4], vec![LinearLinear]).unwrap();
        assert_eq!(g.jump_at(0.0), Some(1));
        assert_eq!(g.jump_at(0.5), None);
        assert_eq!(g.jump_at(0.25), None);
    }
}
