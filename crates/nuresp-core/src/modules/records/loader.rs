use super::parser::read_table;
use super::{EffectiveAreaRecord, EventRecord, RecordStore, SmearingRecord, UptimeInterval, YearRecords};
use crate::common::config::DataConfig;
use crate::common::constants::{
    EFFECTIVE_AREA_COLUMNS, EVENT_COLUMNS, SMEARING_COLUMNS, UPTIME_COLUMNS,
};
use crate::domain::{Detector, NurespResult, Year};
use crate::modules::traits::RecordLoader;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct FileRecordLoader {
    detector: Detector,
    data: DataConfig,
}

impl FileRecordLoader {
    pub fn new(detector: Detector, data: DataConfig) -> Self {
        Self { detector, data }
    }

    pub fn load_effective_area(&self, path: &Path) -> NurespResult<Vec<EffectiveAreaRecord>> {
        debug!(path = %path.display(), "reading effective area table");
        let rows = read_table::<EFFECTIVE_AREA_COLUMNS>(path)?;
        Ok(rows.into_iter().map(EffectiveAreaRecord::from_row).collect())
    }

    pub fn load_smearing(&self, path: &Path) -> NurespResult<Vec<SmearingRecord>> {
        debug!(path = %path.display(), "reading smearing matrix");
        let rows = read_table::<SMEARING_COLUMNS>(path)?;
        Ok(rows.into_iter().map(SmearingRecord::from_row).collect())
    }

    pub fn load_events(&self, year: Year) -> NurespResult<Vec<EventRecord>> {
        let path = self.data.events_path(year)?;
        debug!(path = %path.display(), year, "reading event table");
        let rows = read_table::<EVENT_COLUMNS>(&path)?;
        Ok(rows.into_iter().map(EventRecord::from_row).collect())
    }

    pub fn load_uptime(&self, year: Year) -> NurespResult<Vec<UptimeInterval>> {
        let path = self.data.uptime_path(year)?;
        debug!(path = %path.display(), year, "reading uptime table");
        let rows = read_table::<UPTIME_COLUMNS>(&path)?;
        Ok(rows.into_iter().map(UptimeInterval::from_row).collect())
    }
}

impl RecordLoader for FileRecordLoader {
    fn detector(&self) -> Detector {
        self.detector
    }

    fn load_year(&self, year: Year) -> NurespResult<YearRecords> {
        let effective_area = self.load_effective_area(&self.data.effective_area_path(year)?)?;
        let smearing = self.load_smearing(&self.data.smearing_path(year)?)?;
        Ok(YearRecords::from_vecs(effective_area, smearing))
    }

    /// Each distinct file is parsed once; years resolving to the same file share it.
    fn load_store(&self, years: &[Year]) -> NurespResult<RecordStore> {
        info!(detector = %self.detector, years = years.len(), "loading response records");
        let mut effective_areas: BTreeMap<PathBuf, Arc<[EffectiveAreaRecord]>> = BTreeMap::new();
        let mut smearing: BTreeMap<PathBuf, Arc<[SmearingRecord]>> = BTreeMap::new();
        let mut store = RecordStore::new(self.detector);

        for &year in years {
            let aeff_path = self.data.effective_area_path(year)?;
            let aeff = match effective_areas.get(&aeff_path) {
                Some(records) => Arc::clone(records),
                None => {
                    let records: Arc<[EffectiveAreaRecord]> =
                        self.load_effective_area(&aeff_path)?.into();
                    effective_areas.insert(aeff_path, Arc::clone(&records));
                    records
                }
            };

            let smearing_path = self.data.smearing_path(year)?;
            let smear = match smearing.get(&smearing_path) {
                Some(records) => Arc::clone(records),
                None => {
                    let records: Arc<[SmearingRecord]> = self.load_smearing(&smearing_path)?.into();
                    smearing.insert(smearing_path, Arc::clone(&records));
                    records
                }
            };

            store.insert(year, YearRecords::new(aeff, smear));
        }

        Ok(store)
    }
}
