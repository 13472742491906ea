use crate::common::config::NurespConfig;
use crate::domain::{NurespError, NurespResult, TableGrids, Year};
use crate::modules::cache::{TableCache, read_tables, write_run_config, write_tables};
use crate::modules::conversion::{ConversionTable, ConversionTableBuilder};
use crate::modules::effective_area::{EffectiveAreaEvaluator, EffectiveAreaGrid};
use crate::modules::records::{FileRecordLoader, RecordStore};
use crate::modules::smearing::{SmearingAggregator, SmearingHistograms};
use crate::modules::traits::RecordLoader;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    Cache,
    Built,
}

impl TableSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Built => "built",
        }
    }
}

#[derive(Debug)]
pub struct ResponseReader<L: RecordLoader = FileRecordLoader> {
    config: NurespConfig,
    loader: L,
    grids: TableGrids,
    years: Vec<Year>,
    store: OnceLock<RecordStore>,
    tables: BTreeMap<Year, ConversionTable>,
    source: TableSource,
}

impl ResponseReader<FileRecordLoader> {
    pub fn from_config(config: NurespConfig) -> NurespResult<Self> {
        let loader = FileRecordLoader::new(config.general.detector, config.data.clone());
        Self::open(config, loader)
    }
}

impl<L: RecordLoader> ResponseReader<L> {
    pub fn open(config: NurespConfig, loader: L) -> NurespResult<Self> {
        if loader.detector() != config.general.detector {
            return Err(NurespError::input_validation(
                "INPUT.CONFIG_DETECTOR",
                format!(
                    "loader serves {} but the configuration requests {}",
                    loader.detector(),
                    config.general.detector
                ),
            ));
        }

        let grids = config.grid.table_grids()?;
        let years = config.grid.years();
        let mut reader = Self {
            config,
            loader,
            grids,
            years,
            store: OnceLock::new(),
            tables: BTreeMap::new(),
            source: TableSource::Built,
        };

        match reader.cached_tables() {
            Some(tables) => {
                reader.tables = tables;
                reader.source = TableSource::Cache;
            }
            None => {
                reader.tables = reader.build_tables()?;
                if reader.config.cache.store {
                    reader.store_tables()?;
                }
            }
        }

        info!(
            detector = %reader.config.general.detector,
            years = reader.tables.len(),
            source = reader.source.as_str(),
            "conversion tables ready"
        );
        Ok(reader)
    }

    fn cached_tables(&self) -> Option<BTreeMap<Year, ConversionTable>> {
        let cache = &self.config.cache;
        if !cache.precomputed {
            return None;
        }

        info!(path = %cache.tables.display(), "loading precomputed conversion tables");
        let cached = match read_tables(&cache.tables) {
            Ok(cached) => cached,
            Err(error) => {
                warn!(%error, "precomputed tables unavailable, rebuilding");
                return None;
            }
        };
        match cached.validate(self.config.general.detector, &self.grids, &self.years) {
            Ok(()) => Some(cached.into_tables(&self.years)),
            Err(mismatch) => {
                warn!(%mismatch, "precomputed tables do not match the request, rebuilding");
                None
            }
        }
    }

    fn build_tables(&self) -> NurespResult<BTreeMap<Year, ConversionTable>> {
        let store = self.records()?;
        ConversionTableBuilder::new(store)
            .build_years(&self.grids, &self.years)
            .into_result()
    }

    fn store_tables(&self) -> NurespResult<()> {
        let cache = TableCache::new(
            self.config.general.detector,
            self.grids.clone(),
            self.tables.clone(),
        );
        write_tables(&self.config.cache.tables, &cache)?;
        write_run_config(&self.config.cache.tables, &self.config)?;
        Ok(())
    }

    pub fn records(&self) -> NurespResult<&RecordStore> {
        if let Some(store) = self.store.get() {
            return Ok(store);
        }

        info!(years = self.years.len(), "loading response data");
        let store = self.loader.load_store(&self.years)?;
        Ok(self.store.get_or_init(|| store))
    }

    pub fn config(&self) -> &NurespConfig {
        &self.config
    }

    pub fn grids(&self) -> &TableGrids {
        &self.grids
    }

    pub fn years(&self) -> &[Year] {
        &self.years
    }

    pub const fn source(&self) -> TableSource {
        self.source
    }

    pub fn conversion_tables(&self) -> &BTreeMap<Year, ConversionTable> {
        &self.tables
    }

    pub fn table(&self, year: Year) -> NurespResult<&ConversionTable> {
        self.tables.get(&year).ok_or_else(|| {
            NurespError::input_validation(
                "INPUT.TABLE_YEAR",
                format!("no conversion table for year {}", year),
            )
        })
    }

    pub fn effective_area(
        &self,
        energies: &[f64],
        thetas: &[f64],
        year: Year,
    ) -> NurespResult<EffectiveAreaGrid> {
        EffectiveAreaEvaluator::new(self.records()?).evaluate(energies, thetas, year)
    }

    pub fn smearing(
        &self,
        energies: &[f64],
        thetas: &[f64],
        year: Year,
    ) -> NurespResult<SmearingHistograms> {
        SmearingAggregator::new(self.records()?).aggregate(energies, thetas, year)
    }
}
