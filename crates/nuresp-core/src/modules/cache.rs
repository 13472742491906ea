use crate::common::config::NurespConfig;
use crate::domain::{Detector, NurespError, NurespResult, TableGrids, Year};
use crate::modules::conversion::ConversionTable;
use crate::numerics::within_tolerance;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const GRID_ABS_TOL: f64 = 1.0e-12;
const GRID_REL_TOL: f64 = 1.0e-10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCache {
    pub detector: Detector,
    pub grids: TableGrids,
    pub tables: BTreeMap<Year, ConversionTable>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CacheMismatch {
    #[error("cached tables are for {cached}, requested {requested}")]
    Detector { cached: Detector, requested: Detector },
    #[error("cached tables were evaluated on different grids")]
    Grids,
    #[error("cached tables do not cover year {0}")]
    MissingYear(Year),
    #[error("cached table for year {year} has shape {actual:?}, expected {expected:?}")]
    Shape {
        year: Year,
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },
}

impl TableCache {
    pub fn new(
        detector: Detector,
        grids: TableGrids,
        tables: BTreeMap<Year, ConversionTable>,
    ) -> Self {
        Self {
            detector,
            grids,
            tables,
        }
    }

    pub fn validate(
        &self,
        detector: Detector,
        grids: &TableGrids,
        years: &[Year],
    ) -> Result<(), CacheMismatch> {
        if self.detector != detector {
            return Err(CacheMismatch::Detector {
                cached: self.detector,
                requested: detector,
            });
        }
        if !grids_match(&self.grids, grids) {
            return Err(CacheMismatch::Grids);
        }

        let expected = grids.table_shape();
        for &year in years {
            let table = self.tables.get(&year).ok_or(CacheMismatch::MissingYear(year))?;
            if table.shape() != expected || !table.is_consistent() {
                return Err(CacheMismatch::Shape {
                    year,
                    expected,
                    actual: table.shape(),
                });
            }
        }
        Ok(())
    }

    pub fn into_tables(mut self, years: &[Year]) -> BTreeMap<Year, ConversionTable> {
        self.tables.retain(|year, _| years.contains(year));
        self.tables
    }
}

fn grids_match(lhs: &TableGrids, rhs: &TableGrids) -> bool {
    let axis_match = |left: &[f64], right: &[f64]| {
        left.len() == right.len()
            && left
                .iter()
                .zip(right)
                .all(|(a, b)| within_tolerance(*a, *b, GRID_ABS_TOL, GRID_REL_TOL))
    };
    axis_match(&lhs.unified_grid, &rhs.unified_grid)
        && axis_match(&lhs.energies, &rhs.energies)
        && axis_match(&lhs.thetas, &rhs.thetas)
}

pub fn read_tables(path: &Path) -> NurespResult<TableCache> {
    debug!(path = %path.display(), "reading conversion table cache");
    let source = fs::read_to_string(path).map_err(|source| {
        NurespError::io_system(
            "IO.TABLE_CACHE_READ",
            format!("failed to read table cache '{}': {}", path.display(), source),
        )
    })?;
    serde_json::from_str(&source).map_err(|source| {
        NurespError::input_validation(
            "INPUT.TABLE_CACHE",
            format!("failed to parse table cache '{}': {}", path.display(), source),
        )
    })
}

pub fn write_tables(path: &Path, cache: &TableCache) -> NurespResult<()> {
    write_json(path, cache).map_err(|source| {
        NurespError::io_system(
            "IO.TABLE_CACHE_WRITE",
            format!("failed to write table cache '{}': {}", path.display(), source),
        )
    })?;
    info!(path = %path.display(), years = cache.tables.len(), "conversion tables stored");
    Ok(())
}

pub fn run_config_path(tables: &Path) -> PathBuf {
    tables.with_extension("config.json")
}

pub fn write_run_config(tables: &Path, config: &NurespConfig) -> NurespResult<PathBuf> {
    let path = run_config_path(tables);
    write_json(&path, config).map_err(|source| {
        NurespError::io_system(
            "IO.RUN_CONFIG_WRITE",
            format!("failed to write run configuration '{}': {}", path.display(), source),
        )
    })?;
    debug!(path = %path.display(), "run configuration stored");
    Ok(path)
}

fn write_json(path: &Path, value: &impl Serialize) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()
}
