pub mod errors;

pub use errors::{NurespError, NurespErrorCategory, NurespResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type Year = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum Detector {
    #[default]
    #[serde(rename = "icecube")]
    IceCube,
}

impl Detector {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IceCube => "icecube",
        }
    }

    pub fn from_identifier(identifier: &str) -> NurespResult<Self> {
        match identifier.trim().to_ascii_lowercase().as_str() {
            "icecube" => Ok(Self::IceCube),
            other => Err(NurespError::input_validation(
                "INPUT.CONFIG_DETECTOR",
                format!("unknown detector '{}'; supported detectors: icecube", other),
            )),
        }
    }
}

impl Display for Detector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellGrid<T> {
    angles: usize,
    energies: usize,
    cells: Vec<T>,
}

impl<T> CellGrid<T> {
    pub fn from_fn(
        angles: usize,
        energies: usize,
        mut cell: impl FnMut(usize, usize) -> T,
    ) -> Self {
        let mut cells = Vec::with_capacity(angles * energies);
        for angle_index in 0..angles {
            for energy_index in 0..energies {
                cells.push(cell(angle_index, energy_index));
            }
        }
        Self {
            angles,
            energies,
            cells,
        }
    }

    pub fn try_from_fn<E>(
        angles: usize,
        energies: usize,
        mut cell: impl FnMut(usize, usize) -> Result<T, E>,
    ) -> Result<Self, E> {
        let mut cells = Vec::with_capacity(angles * energies);
        for angle_index in 0..angles {
            for energy_index in 0..energies {
                cells.push(cell(angle_index, energy_index)?);
            }
        }
        Ok(Self {
            angles,
            energies,
            cells,
        })
    }

    pub const fn shape(&self) -> (usize, usize) {
        (self.angles, self.energies)
    }

    pub fn get(&self, angle_index: usize, energy_index: usize) -> Option<&T> {
        if angle_index >= self.angles || energy_index >= self.energies {
            return None;
        }
        self.cells.get(angle_index * self.energies + energy_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let energies = self.energies.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(flat, cell)| ((flat / energies, flat % energies), cell))
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> CellGrid<U> {
        CellGrid {
            angles: self.angles,
            energies: self.energies,
            cells: self.cells.iter().map(&mut f).collect(),
        }
    }
}

/// `energies` are injected energies in GeV, `thetas` zenith angles in degrees and
/// `unified_grid` the reference axis in log10(E/GeV).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGrids {
    pub unified_grid: Vec<f64>,
    pub energies: Vec<f64>,
    pub thetas: Vec<f64>,
}

impl TableGrids {
    pub fn new(unified_grid: Vec<f64>, energies: Vec<f64>, thetas: Vec<f64>) -> Self {
        Self {
            unified_grid,
            energies,
            thetas,
        }
    }

    pub fn table_shape(&self) -> (usize, usize, usize) {
        (
            self.thetas.len(),
            self.energies.len(),
            self.unified_grid.len(),
        )
    }

    pub fn validate(&self) -> NurespResult<()> {
        validate_unified_grid(&self.unified_grid)?;
        validate_energy_grid(&self.energies)?;
        validate_thetas(&self.thetas)
    }
}

pub fn validate_unified_grid(unified_grid: &[f64]) -> NurespResult<()> {
    for (index, value) in unified_grid.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(NurespError::input_validation(
                "INPUT.UNIFIED_GRID",
                format!("unified grid entry {} must be finite, got {}", index, value),
            ));
        }
        if index > 0 && value <= unified_grid[index - 1] {
            return Err(NurespError::input_validation(
                "INPUT.UNIFIED_GRID",
                format!(
                    "unified grid must be strictly increasing, index {} has {} after {}",
                    index,
                    value,
                    unified_grid[index - 1]
                ),
            ));
        }
    }
    Ok(())
}

pub fn validate_energy_grid(energies: &[f64]) -> NurespResult<()> {
    match energies
        .iter()
        .copied()
        .enumerate()
        .find(|(_, energy)| !energy.is_finite() || *energy <= 0.0)
    {
        Some((index, energy)) => Err(NurespError::input_validation(
            "INPUT.ENERGY_GRID",
            format!(
                "injected energy {} must be finite and > 0 GeV, got {}",
                index, energy
            ),
        )),
        None => Ok(()),
    }
}

pub fn validate_thetas(thetas: &[f64]) -> NurespResult<()> {
    match thetas
        .iter()
        .copied()
        .enumerate()
        .find(|(_, theta)| !(0.0..=180.0).contains(theta))
    {
        Some((index, theta)) => Err(NurespError::input_validation(
            "INPUT.ZENITH_GRID",
            format!(
                "zenith angle {} must lie within [0, 180] degrees, got {}",
                index, theta
            ),
        )),
        None => Ok(()),
    }
}
