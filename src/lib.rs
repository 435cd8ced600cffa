// Internal building blocks
mod grid;
mod linearise;

pub mod config;
pub mod distribution;
pub mod distribution_data;
pub mod error;
pub mod grid_distributions;
pub mod interpolation;
pub mod legendre;
pub mod tabulated_function;

pub use config::{Config, CONFIG};
pub use distribution::{Distribution, LegendreDistribution, TabulatedDistribution};
pub use distribution_data::{
    AngularDistributions, DistributionData, DistributionDataType, EnergyDistributions,
    LegendreAngularDistributions, ReferenceFrame, TabulatedAngularDistributions,
    TabulatedEnergyDistributions, TwoBodyDistributionData, UncorrelatedDistributionData,
};
pub use error::{DistributionError, Result};
pub use grid_distributions::GridDistributions;
pub use interpolation::InterpolationType;
pub use legendre::LegendreSeries;
pub use linearise::LinearisationTolerance;
pub use tabulated_function::TabulatedFunction;
