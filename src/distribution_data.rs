// Angle and energy data of a reaction product
//
// Two shapes are supported: two-body data, where only the angle is stored and
// the outgoing energy follows from kinematics, and uncorrelated data, where
// angle and energy are sampled independently of each other.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::distribution::{LegendreDistribution, TabulatedDistribution};
use crate::error::{DistributionError, Result};
use crate::grid_distributions::GridDistributions;
use crate::linearise::LinearisationTolerance;

pub type LegendreAngularDistributions = GridDistributions<LegendreDistribution>;
pub type TabulatedAngularDistributions = GridDistributions<TabulatedDistribution>;
pub type TabulatedEnergyDistributions = GridDistributions<TabulatedDistribution>;

/// Frame in which the distribution data is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceFrame {
    #[serde(rename = "lab")]
    Laboratory,
    #[serde(rename = "centerOfMass")]
    CentreOfMass,
}

impl ReferenceFrame {
    /// Map the ENDF reference frame flag (LCT)
    pub fn from_endf(lct: i32) -> Result<Self> {
        match lct {
            1 => Ok(ReferenceFrame::Laboratory),
            2 => Ok(ReferenceFrame::CentreOfMass),
            _ => Err(DistributionError::invalid_input(format!(
                "unsupported ENDF reference frame flag: {}",
                lct
            ))),
        }
    }
}

impl FromStr for ReferenceFrame {
    type Err = DistributionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lab" => Ok(ReferenceFrame::Laboratory),
            "centerOfMass" => Ok(ReferenceFrame::CentreOfMass),
            _ => Err(DistributionError::invalid_input(format!(
                "unknown reference frame: '{}'",
                s
            ))),
        }
    }
}

/// Kind of distribution data attached to a reaction product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistributionDataType {
    #[serde(rename = "angularTwoBody")]
    TwoBody,
    #[serde(rename = "uncorrelated")]
    Uncorrelated,
}

impl FromStr for DistributionDataType {
    type Err = DistributionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "angularTwoBody" => Ok(DistributionDataType::TwoBody),
            "uncorrelated" => Ok(DistributionDataType::Uncorrelated),
            _ => Err(DistributionError::invalid_input(format!(
                "unknown distribution data type: '{}'",
                s
            ))),
        }
    }
}

/// Angular distributions as a function of incident energy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AngularDistributions {
    Isotropic,
    Legendre(LegendreAngularDistributions),
    Tabulated(TabulatedAngularDistributions),
}

impl AngularDistributions {
    /// Density of the scattering cosine `mu` at incident `energy`
    pub fn evaluate(&self, energy: f64, mu: f64) -> f64 {
        match self {
            AngularDistributions::Isotropic => {
                if (-1.0..=1.0).contains(&mu) {
                    0.5
                } else {
                    0.0
                }
            }
            AngularDistributions::Legendre(grid) => grid.evaluate(energy, mu),
            AngularDistributions::Tabulated(grid) => grid.evaluate(energy, mu),
        }
    }

    pub fn normalise(&self) -> Result<Self> {
        Ok(match self {
            AngularDistributions::Isotropic => AngularDistributions::Isotropic,
            AngularDistributions::Legendre(grid) => AngularDistributions::Legendre(grid.normalise()?),
            AngularDistributions::Tabulated(grid) => AngularDistributions::Tabulated(grid.normalise()?),
        })
    }

    /// Legendre data becomes tabulated data, isotropic data stays isotropic
    pub fn linearise(&self, tolerance: &LinearisationTolerance) -> Result<Self> {
        Ok(match self {
            AngularDistributions::Isotropic => AngularDistributions::Isotropic,
            AngularDistributions::Legendre(grid) => AngularDistributions::Tabulated(grid.linearise(tolerance)?),
            AngularDistributions::Tabulated(grid) => AngularDistributions::Tabulated(grid.linearise(tolerance)?),
        })
    }

    /// Sample the scattering cosine at incident `energy`
    pub fn sample<R: Rng + ?Sized>(&self, energy: f64, rng: &mut R) -> Result<f64> {
        let mu = match self {
            AngularDistributions::Isotropic => 2.0 * rng.gen::<f64>() - 1.0,
            AngularDistributions::Legendre(grid) => grid.sample(energy, rng)?,
            AngularDistributions::Tabulated(grid) => grid.sample(energy, rng)?,
        };
        Ok(mu.clamp(-1.0, 1.0))
    }
}

/// Outgoing energy distributions as a function of incident energy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EnergyDistributions {
    /// Sum of several weighted energy laws, not represented yet
    MultiPart,
    Tabulated(TabulatedEnergyDistributions),
}

impl EnergyDistributions {
    pub fn evaluate(&self, energy: f64, energy_out: f64) -> Result<f64> {
        match self {
            EnergyDistributions::MultiPart => Err(DistributionError::unsupported(
                "multi-part energy distributions cannot be evaluated",
            )),
            EnergyDistributions::Tabulated(grid) => Ok(grid.evaluate(energy, energy_out)),
        }
    }

    pub fn normalise(&self) -> Result<Self> {
        Ok(match self {
            EnergyDistributions::MultiPart => EnergyDistributions::MultiPart,
            EnergyDistributions::Tabulated(grid) => EnergyDistributions::Tabulated(grid.normalise()?),
        })
    }

    pub fn linearise(&self, tolerance: &LinearisationTolerance) -> Result<Self> {
        Ok(match self {
            EnergyDistributions::MultiPart => EnergyDistributions::MultiPart,
            EnergyDistributions::Tabulated(grid) => EnergyDistributions::Tabulated(grid.linearise(tolerance)?),
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, energy: f64, rng: &mut R) -> Result<f64> {
        match self {
            EnergyDistributions::MultiPart => Err(DistributionError::unsupported(
                "multi-part energy distributions cannot be sampled",
            )),
            EnergyDistributions::Tabulated(grid) => grid.sample(energy, rng),
        }
    }
}

/// Angular data of a two-body reaction product.
///
/// The outgoing energy is fixed by kinematics and therefore not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoBodyDistributionData {
    frame: ReferenceFrame,
    angle: AngularDistributions,
}

impl TwoBodyDistributionData {
    pub fn new(frame: ReferenceFrame, angle: AngularDistributions) -> Self {
        TwoBodyDistributionData { frame, angle }
    }

    pub fn data_type(&self) -> DistributionDataType {
        DistributionDataType::TwoBody
    }

    pub fn frame(&self) -> ReferenceFrame {
        self.frame
    }

    pub fn angle(&self) -> &AngularDistributions {
        &self.angle
    }

    pub fn normalise(&self) -> Result<Self> {
        Ok(TwoBodyDistributionData {
            frame: self.frame,
            angle: self.angle.normalise()?,
        })
    }

    pub fn linearise(&self, tolerance: &LinearisationTolerance) -> Result<Self> {
        Ok(TwoBodyDistributionData {
            frame: self.frame,
            angle: self.angle.linearise(tolerance)?,
        })
    }

    /// Sample the scattering cosine in the data's reference frame
    pub fn sample<R: Rng + ?Sized>(&self, energy: f64, rng: &mut R) -> Result<f64> {
        self.angle.sample(energy, rng)
    }
}

/// Independent angle and energy data of a reaction product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncorrelatedDistributionData {
    frame: ReferenceFrame,
    angle: AngularDistributions,
    energy: EnergyDistributions,
}

impl UncorrelatedDistributionData {
    pub fn new(frame: ReferenceFrame, angle: AngularDistributions, energy: EnergyDistributions) -> Self {
        UncorrelatedDistributionData { frame, angle, energy }
    }

    pub fn data_type(&self) -> DistributionDataType {
        DistributionDataType::Uncorrelated
    }

    pub fn frame(&self) -> ReferenceFrame {
        self.frame
    }

    pub fn angle(&self) -> &AngularDistributions {
        &self.angle
    }

    pub fn energy(&self) -> &EnergyDistributions {
        &self.energy
    }

    pub fn normalise(&self) -> Result<Self> {
        Ok(UncorrelatedDistributionData {
            frame: self.frame,
            angle: self.angle.normalise()?,
            energy: self.energy.normalise()?,
        })
    }

    pub fn linearise(&self, tolerance: &LinearisationTolerance) -> Result<Self> {
        Ok(UncorrelatedDistributionData {
            frame: self.frame,
            angle: self.angle.linearise(tolerance)?,
            energy: self.energy.linearise(tolerance)?,
        })
    }

    /// Sample `(outgoing energy, scattering cosine)` at incident `energy`.
    ///
    /// The angle and energy are sampled independently of each other.
    pub fn sample<R: Rng + ?Sized>(&self, energy: f64, rng: &mut R) -> Result<(f64, f64)> {
        let mu = self.angle.sample(energy, rng)?;
        let e_out = self.energy.sample(energy, rng)?;
        Ok((e_out, mu))
    }
}

/// Either shape of distribution data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DistributionData {
    #[serde(rename = "angularTwoBody")]
    TwoBody(TwoBodyDistributionData),
    #[serde(rename = "uncorrelated")]
    Uncorrelated(UncorrelatedDistributionData),
}

impl DistributionData {
    pub fn data_type(&self) -> DistributionDataType {
        match self {
            DistributionData::TwoBody(data) => data.data_type(),
            DistributionData::Uncorrelated(data) => data.data_type(),
        }
    }

    pub fn frame(&self) -> ReferenceFrame {
        match self {
            DistributionData::TwoBody(data) => data.frame(),
            DistributionData::Uncorrelated(data) => data.frame(),
        }
    }

    pub fn angle(&self) -> &AngularDistributions {
        match self {
            DistributionData::TwoBody(data) => data.angle(),
            DistributionData::Uncorrelated(data) => data.angle(),
        }
    }

    pub fn normalise(&self) -> Result<Self> {
        Ok(match self {
            DistributionData::TwoBody(data) => DistributionData::TwoBody(data.normalise()?),
            DistributionData::Uncorrelated(data) => DistributionData::Uncorrelated(data.normalise()?),
        })
    }

    pub fn linearise(&self, tolerance: &LinearisationTolerance) -> Result<Self> {
        Ok(match self {
            DistributionData::TwoBody(data) => DistributionData::TwoBody(data.linearise(tolerance)?),
            DistributionData::Uncorrelated(data) => DistributionData::Uncorrelated(data.linearise(tolerance)?),
        })
    }
}

impl From<TwoBodyDistributionData> for DistributionData {
    fn from(data: TwoBodyDistributionData) -> Self {
        DistributionData::TwoBody(data)
    }
}

impl From<UncorrelatedDistributionData> for DistributionData {
    fn from(data: UncorrelatedDistributionData) -> Self {
        DistributionData::Uncorrelated(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Distribution;
    use crate::tabulated_function::TabulatedFunction;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn legendre_angles() -> AngularDistributions {
        AngularDistributions::Legendre(
            GridDistributions::linear(
                vec![1e5, 2e7],
                vec![
                    LegendreDistribution::from_coefficients(vec![1.0]).unwrap(),
                    LegendreDistribution::from_coefficients(vec![1.0, 0.5]).unwrap(),
                ],
            )
            .unwrap(),
        )
    }

    fn tabulated_energies() -> EnergyDistributions {
        let spectrum = |peak: f64| {
            TabulatedDistribution::new(
                TabulatedFunction::linear(vec![0.0, peak, 2.0 * peak], vec![0.0, 2.0, 0.0]).unwrap(),
            )
        };
        EnergyDistributions::Tabulated(
            GridDistributions::linear(vec![1e5, 2e7], vec![spectrum(1e4), spectrum(1e6)]).unwrap(),
        )
    }

    #[test]
    fn test_reference_frame_codes() {
        assert_eq!(ReferenceFrame::from_endf(1).unwrap(), ReferenceFrame::Laboratory);
        assert_eq!(ReferenceFrame::from_endf(2).unwrap(), ReferenceFrame::CentreOfMass);
        assert!(matches!(
            ReferenceFrame::from_endf(3),
            Err(DistributionError::InvalidInput(_))
        ));
        assert_eq!("centerOfMass".parse::<ReferenceFrame>().unwrap(), ReferenceFrame::CentreOfMass);
        assert!("cm".parse::<ReferenceFrame>().is_err());
    }

    #[test]
    fn test_data_type_names() {
        assert_eq!(
            "angularTwoBody".parse::<DistributionDataType>().unwrap(),
            DistributionDataType::TwoBody
        );
        assert_eq!(
            "uncorrelated".parse::<DistributionDataType>().unwrap(),
            DistributionDataType::Uncorrelated
        );
        assert!("KalbachMann".parse::<DistributionDataType>().is_err());
    }

    #[test]
    fn test_isotropic() {
        let angle = AngularDistributions::Isotropic;
        assert_eq!(angle.evaluate(1e6, 0.3), 0.5);
        assert_eq!(angle.evaluate(1e6, 1.5), 0.0);
        assert_eq!(angle.normalise().unwrap(), AngularDistributions::Isotropic);

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let mu = angle.sample(1e6, &mut rng).unwrap();
            assert!((-1.0..=1.0).contains(&mu));
        }
    }

    #[test]
    fn test_normalise_dispatch() {
        let data = TwoBodyDistributionData::new(ReferenceFrame::CentreOfMass, legendre_angles());
        let normalised = data.normalise().unwrap();
        assert_eq!(normalised.frame(), ReferenceFrame::CentreOfMass);
        match normalised.angle() {
            AngularDistributions::Legendre(grid) => {
                for distribution in grid.distributions() {
                    assert!((distribution.integral() - 1.0).abs() < 1e-12);
                }
            }
            other => panic!("unexpected variant {:?}", other),
        }
    }

    #[test]
    fn test_multi_part_placeholder() {
        let energy = EnergyDistributions::MultiPart;
        assert_eq!(energy.normalise().unwrap(), EnergyDistributions::MultiPart);
        assert!(matches!(energy.evaluate(1e6, 1e5), Err(DistributionError::Unsupported(_))));

        let data = UncorrelatedDistributionData::new(
            ReferenceFrame::Laboratory,
            AngularDistributions::Isotropic,
            EnergyDistributions::MultiPart,
        );
        assert!(data.normalise().is_ok());
        let mut rng = StdRng::seed_from_u64(42);
        assert!(matches!(data.sample(1e6, &mut rng), Err(DistributionError::Unsupported(_))));
    }

    #[test]
    fn test_uncorrelated_sampling() {
        let data = UncorrelatedDistributionData::new(
            ReferenceFrame::Laboratory,
            legendre_angles(),
            tabulated_energies(),
        )
        .normalise()
        .unwrap();
        assert_eq!(data.data_type(), DistributionDataType::Uncorrelated);

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let (e_out, mu) = data.sample(2e7, &mut rng).unwrap();
            assert!((0.0..=2e6).contains(&e_out));
            assert!((-1.0..=1.0).contains(&mu));
        }
    }

    #[test]
    fn test_linearise_converts_legendre_data() {
        let data: DistributionData =
            TwoBodyDistributionData::new(ReferenceFrame::Laboratory, legendre_angles()).into();
        let tolerance = LinearisationTolerance::new(1e-3, 1e-10).unwrap();
        let linear = data.linearise(&tolerance).unwrap();
        assert_eq!(linear.data_type(), DistributionDataType::TwoBody);
        assert!(matches!(linear.angle(), AngularDistributions::Tabulated(_)));
        assert!((linear.angle().evaluate(2e7, 1.0) - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_serde_tags() {
        let data: DistributionData = UncorrelatedDistributionData::new(
            ReferenceFrame::CentreOfMass,
            AngularDistributions::Isotropic,
            tabulated_energies(),
        )
        .into();
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "uncorrelated");
        assert_eq!(json["frame"], "centerOfMass");
        assert_eq!(json["angle"]["type"], "Isotropic");
        let back: DistributionData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }
}
