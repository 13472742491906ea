use crate::domain::{Detector, NurespError, NurespResult, TableGrids, Year};
use crate::numerics::{geometric_centers, log_grid, stepped_range};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NurespConfig {
    pub general: GeneralConfig,
    pub data: DataConfig,
    pub grid: GridConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneralConfig {
    pub detector: Detector,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataConfig {
    pub root: PathBuf,
    pub effective_areas: Vec<PathBuf>,
    pub smearing: Vec<PathBuf>,
    pub events: Vec<PathBuf>,
    pub uptime: Vec<PathBuf>,
    /// Years that reuse another year's effective-area table verbatim.
    pub effective_area_aliases: BTreeMap<Year, Year>,
}

impl Default for DataConfig {
    fn default() -> Self {
        let seasons = [
            "IC40", "IC59", "IC79", "IC86_I", "IC86_II", "IC86_III", "IC86_IV", "IC86_V",
            "IC86_VI", "IC86_VII",
        ];
        let irf_seasons = &seasons[..5];

        Self {
            root: PathBuf::from("icecube_10year_ps"),
            effective_areas: irf_seasons
                .iter()
                .map(|season| PathBuf::from(format!("irfs/{season}_effectiveArea.csv")))
                .collect(),
            // IC86_II onwards share one smearing matrix.
            smearing: (0..seasons.len())
                .map(|index| {
                    let irf_season = irf_seasons.get(index).unwrap_or(&"IC86_II");
                    PathBuf::from(format!("irfs/{irf_season}_smearing.csv"))
                })
                .collect(),
            events: seasons
                .iter()
                .map(|season| PathBuf::from(format!("events/{season}_exp.csv")))
                .collect(),
            uptime: seasons
                .iter()
                .map(|season| PathBuf::from(format!("uptime/{season}_exp.csv")))
                .collect(),
            effective_area_aliases: (5..10).map(|year| (year, 4)).collect(),
        }
    }
}

impl DataConfig {
    /// Year whose effective-area file serves `year`, following at most one alias.
    pub fn effective_area_source_year(&self, year: Year) -> Year {
        if (year as usize) < self.effective_areas.len() {
            year
        } else {
            self.effective_area_aliases
                .get(&year)
                .copied()
                .unwrap_or(year)
        }
    }

    pub fn effective_area_path(&self, year: Year) -> NurespResult<PathBuf> {
        let source_year = self.effective_area_source_year(year);
        self.resolve(&self.effective_areas, source_year, "effective area")
    }

    pub fn smearing_path(&self, year: Year) -> NurespResult<PathBuf> {
        self.resolve(&self.smearing, year, "smearing matrix")
    }

    pub fn events_path(&self, year: Year) -> NurespResult<PathBuf> {
        self.resolve(&self.events, year, "event")
    }

    pub fn uptime_path(&self, year: Year) -> NurespResult<PathBuf> {
        self.resolve(&self.uptime, year, "uptime")
    }

    fn resolve(&self, files: &[PathBuf], year: Year, kind: &str) -> NurespResult<PathBuf> {
        files
            .get(year as usize)
            .map(|file| self.root.join(file))
            .ok_or_else(|| {
                NurespError::input_validation(
                    "INPUT.CONFIG_DATA_FILES",
                    format!(
                        "no {} data file configured for year {} ({} files listed)",
                        kind,
                        year,
                        files.len()
                    ),
                )
            })
    }
}

/// `edge_count` log-spaced bin edges between `10^start_log10` and `10^stop_log10` GeV.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyBinning {
    pub start_log10: f64,
    pub stop_log10: f64,
    pub edge_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AngleRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    pub energy_bins: EnergyBinning,
    pub thetas: AngleRange,
    pub years: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            energy_bins: EnergyBinning {
                start_log10: 2.0,
                stop_log10: 9.0,
                edge_count: 71,
            },
            thetas: AngleRange {
                start: 0.0,
                stop: 180.0,
                step: 1.0,
            },
            years: 10,
        }
    }
}

impl GridConfig {
    pub fn energy_bin_edges(&self) -> NurespResult<Vec<f64>> {
        let bins = self.energy_bins;
        if !bins.start_log10.is_finite() || !bins.stop_log10.is_finite() {
            return Err(NurespError::input_validation(
                "INPUT.CONFIG_ENERGY_BINS",
                format!(
                    "energy bin exponents must be finite, got [{}, {}]",
                    bins.start_log10, bins.stop_log10
                ),
            ));
        }
        log_grid(bins.start_log10, bins.stop_log10, bins.edge_count).ok_or_else(|| {
            NurespError::input_validation(
                "INPUT.CONFIG_ENERGY_BINS",
                format!(
                    "energy binning needs at least 2 edges, got {}",
                    bins.edge_count
                ),
            )
        })
    }

    pub fn energy_grid(&self) -> NurespResult<Vec<f64>> {
        Ok(geometric_centers(&self.energy_bin_edges()?))
    }

    pub fn unified_grid(&self) -> NurespResult<Vec<f64>> {
        Ok(self
            .energy_grid()?
            .into_iter()
            .map(f64::log10)
            .collect())
    }

    pub fn thetas(&self) -> NurespResult<Vec<f64>> {
        let range = self.thetas;
        stepped_range(range.start, range.stop, range.step).ok_or_else(|| {
            NurespError::input_validation(
                "INPUT.CONFIG_THETAS",
                format!(
                    "zenith range [{}, {}) with step {} is not a valid grid",
                    range.start, range.stop, range.step
                ),
            )
        })
    }

    pub fn years(&self) -> Vec<Year> {
        (0..self.years).collect()
    }

    pub fn table_grids(&self) -> NurespResult<TableGrids> {
        let grids = TableGrids::new(self.unified_grid()?, self.energy_grid()?, self.thetas()?);
        grids.validate()?;
        Ok(grids)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    pub precomputed: bool,
    pub tables: PathBuf,
    pub store: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            precomputed: true,
            tables: PathBuf::from("data/icecube_standard.json"),
            store: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<ConfigError> for NurespError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Read { .. } => NurespError::io_system("IO.CONFIG_READ", error.to_string()),
            ConfigError::Parse { .. } => {
                NurespError::input_validation("INPUT.CONFIG_PARSE", error.to_string())
            }
        }
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<NurespConfig, ConfigError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, GridConfig, NurespConfig, load_config};
    use crate::domain::{Detector, NurespError, NurespErrorCategory};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn default_grid_matches_ten_year_layout() {
        let grid = GridConfig::default();
        let energies = grid.energy_grid().expect("energy grid");
        let unified = grid.unified_grid().expect("unified grid");
        let thetas = grid.thetas().expect("thetas");

        assert_eq!(energies.len(), 70);
        assert_eq!(unified.len(), 70);
        assert!((unified[0] - 2.05).abs() < 1.0e-12);
        assert!((unified[69] - 8.95).abs() < 1.0e-12);
        assert_eq!(thetas.len(), 180);
        assert_eq!(grid.years(), (0..10).collect::<Vec<_>>());
        assert_eq!(grid.table_grids().expect("grids").table_shape(), (180, 70, 70));
    }

    #[test]
    fn default_data_layout_aliases_late_effective_areas() {
        let config = NurespConfig::default();
        let data = &config.data;

        assert_eq!(data.effective_areas.len(), 5);
        assert_eq!(data.smearing.len(), 10);
        assert_eq!(data.effective_area_source_year(2), 2);
        assert_eq!(data.effective_area_source_year(7), 4);
        assert_eq!(
            data.effective_area_path(9).expect("aliased path"),
            PathBuf::from("icecube_10year_ps/irfs/IC86_II_effectiveArea.csv")
        );
        assert_eq!(
            data.smearing_path(9).expect("smearing path"),
            PathBuf::from("icecube_10year_ps/irfs/IC86_II_smearing.csv")
        );
        assert_eq!(
            data.uptime_path(3).expect("uptime path"),
            PathBuf::from("icecube_10year_ps/uptime/IC86_I_exp.csv")
        );
        assert_eq!(
            data.effective_area_path(12).unwrap_err().placeholder(),
            "INPUT.CONFIG_DATA_FILES"
        );
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_sections() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{
              "general": { "detector": "icecube" },
              "grid": {
                "energyBins": { "startLog10": 2.0, "stopLog10": 3.0, "edgeCount": 3 },
                "thetas": { "start": 80.0, "stop": 100.0, "step": 10.0 },
                "years": 2
              },
              "data": { "root": "fixtures", "effectiveAreaAliases": { "1": 0 } }
            }"#,
        )
        .expect("config should be written");

        let config = load_config(&path).expect("config should load");
        assert_eq!(config.general.detector, Detector::IceCube);
        assert_eq!(config.grid.thetas().expect("thetas"), vec![80.0, 90.0]);
        assert_eq!(config.grid.energy_grid().expect("energies").len(), 2);
        assert_eq!(config.data.root, PathBuf::from("fixtures"));
        assert_eq!(config.data.effective_area_aliases.get(&1), Some(&0));
        assert!(config.cache.precomputed);
    }

    #[test]
    fn unknown_detector_is_rejected_while_parsing() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{ "general": { "detector": "antares" } }"#)
            .expect("config should be written");

        let error = load_config(&path).expect_err("detector should be rejected");
        assert!(matches!(error, ConfigError::Parse { .. }));
        let error = NurespError::from(error);
        assert_eq!(error.category(), NurespErrorCategory::InputValidationError);
    }

    #[test]
    fn missing_file_maps_to_io_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = load_config(temp.path().join("absent.json")).expect_err("read should fail");
        assert_eq!(
            NurespError::from(error).category(),
            NurespErrorCategory::IoSystemError
        );
    }

    #[test]
    fn invalid_grid_parameters_are_input_errors() {
        let mut grid = GridConfig::default();
        grid.energy_bins.edge_count = 1;
        assert_eq!(
            grid.energy_grid().unwrap_err().placeholder(),
            "INPUT.CONFIG_ENERGY_BINS"
        );

        let mut grid = GridConfig::default();
        grid.thetas.step = 0.0;
        assert_eq!(grid.thetas().unwrap_err().placeholder(), "INPUT.CONFIG_THETAS");
    }
}
