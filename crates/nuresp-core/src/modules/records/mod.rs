mod loader;
mod parser;

pub use loader::FileRecordLoader;
pub use parser::{TableParseError, parse_table, read_table};

use crate::domain::{Detector, NurespError, NurespResult, Year};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Energies are log10(E/GeV), declinations degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TrueBin {
    pub e_min: f64,
    pub e_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct EffectiveAreaRecord {
    pub bin: TrueBin,
    /// cm^2
    pub aeff: f64,
}

impl EffectiveAreaRecord {
    pub fn from_row(row: [f64; 5]) -> Self {
        let [e_min, e_max, dec_min, dec_max, aeff] = row;
        Self {
            bin: TrueBin {
                e_min,
                e_max,
                dec_min,
                dec_max,
            },
            aeff,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SmearingRecord {
    pub bin: TrueBin,
    pub e_rec_min: f64,
    pub e_rec_max: f64,
    pub psf_min: f64,
    pub psf_max: f64,
    pub angerr_min: f64,
    pub angerr_max: f64,
    pub fractional_counts: f64,
}

impl SmearingRecord {
    pub fn from_row(row: [f64; 11]) -> Self {
        let [
            e_min,
            e_max,
            dec_min,
            dec_max,
            e_rec_min,
            e_rec_max,
            psf_min,
            psf_max,
            angerr_min,
            angerr_max,
            fractional_counts,
        ] = row;
        Self {
            bin: TrueBin {
                e_min,
                e_max,
                dec_min,
                dec_max,
            },
            e_rec_min,
            e_rec_max,
            psf_min,
            psf_max,
            angerr_min,
            angerr_max,
            fractional_counts,
        }
    }

    pub fn e_rec_center(&self) -> f64 {
        (self.e_rec_min + self.e_rec_max) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct EventRecord {
    pub mjd: f64,
    pub log10_energy: f64,
    pub angerr: f64,
    pub ra: f64,
    pub dec: f64,
    pub azimuth: f64,
    pub zenith: f64,
}

impl EventRecord {
    pub fn from_row(row: [f64; 7]) -> Self {
        let [mjd, log10_energy, angerr, ra, dec, azimuth, zenith] = row;
        Self {
            mjd,
            log10_energy,
            angerr,
            ra,
            dec,
            azimuth,
            zenith,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct UptimeInterval {
    pub start_mjd: f64,
    pub stop_mjd: f64,
}

impl UptimeInterval {
    pub fn from_row(row: [f64; 2]) -> Self {
        Self {
            start_mjd: row[0],
            stop_mjd: row[1],
        }
    }

    pub fn duration_days(&self) -> f64 {
        self.stop_mjd - self.start_mjd
    }
}

pub trait BinnedRecord {
    fn true_bin(&self) -> &TrueBin;
}

impl BinnedRecord for EffectiveAreaRecord {
    fn true_bin(&self) -> &TrueBin {
        &self.bin
    }
}

impl BinnedRecord for SmearingRecord {
    fn true_bin(&self) -> &TrueBin {
        &self.bin
    }
}

/// One year's response tables. Aliased years share the same allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct YearRecords {
    pub effective_area: Arc<[EffectiveAreaRecord]>,
    pub smearing: Arc<[SmearingRecord]>,
}

impl YearRecords {
    pub fn new(effective_area: Arc<[EffectiveAreaRecord]>, smearing: Arc<[SmearingRecord]>) -> Self {
        Self {
            effective_area,
            smearing,
        }
    }

    pub fn from_vecs(
        effective_area: Vec<EffectiveAreaRecord>,
        smearing: Vec<SmearingRecord>,
    ) -> Self {
        Self::new(effective_area.into(), smearing.into())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordStore {
    detector: Detector,
    years: BTreeMap<Year, YearRecords>,
}

impl RecordStore {
    pub fn new(detector: Detector) -> Self {
        Self {
            detector,
            years: BTreeMap::new(),
        }
    }

    pub fn with_year(mut self, year: Year, records: YearRecords) -> Self {
        self.insert(year, records);
        self
    }

    pub fn insert(&mut self, year: Year, records: YearRecords) {
        self.years.insert(year, records);
    }

    pub const fn detector(&self) -> Detector {
        self.detector
    }

    pub fn years(&self) -> impl Iterator<Item = Year> + '_ {
        self.years.keys().copied()
    }

    pub fn year(&self, year: Year) -> NurespResult<&YearRecords> {
        self.years.get(&year).ok_or_else(|| {
            NurespError::input_validation(
                "INPUT.RECORD_YEAR",
                format!(
                    "no {} response records loaded for year {}",
                    self.detector, year
                ),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        EffectiveAreaRecord, RecordStore, SmearingRecord, UptimeInterval, YearRecords,
    };
    use crate::domain::Detector;
    use std::sync::Arc;

    #[test]
    fn rows_map_to_documented_column_order() {
        let aeff = EffectiveAreaRecord::from_row([2.0, 2.2, -10.0, 10.0, 5.5]);
        assert_eq!(aeff.bin.e_max, 2.2);
        assert_eq!(aeff.bin.dec_min, -10.0);
        assert_eq!(aeff.aeff, 5.5);

        let smear = SmearingRecord::from_row([
            2.0, 2.2, -10.0, 10.0, 1.5, 2.5, 0.0, 0.2, 0.1, 0.3, 0.25,
        ]);
        assert_eq!(smear.e_rec_center(), 2.0);
        assert_eq!(smear.psf_max, 0.2);
        assert_eq!(smear.angerr_min, 0.1);
        assert_eq!(smear.fractional_counts, 0.25);

        assert_eq!(UptimeInterval::from_row([10.0, 10.5]).duration_days(), 0.5);
    }

    #[test]
    fn store_reports_missing_years() {
        let records = YearRecords::from_vecs(Vec::new(), Vec::new());
        let store = RecordStore::new(Detector::IceCube).with_year(3, records);

        assert!(store.year(3).is_ok());
        assert_eq!(store.years().collect::<Vec<_>>(), vec![3]);
        let error = store.year(4).expect_err("year 4 was never loaded");
        assert_eq!(error.placeholder(), "INPUT.RECORD_YEAR");
    }

    #[test]
    fn aliased_years_share_effective_area_tables() {
        let shared: Arc<[EffectiveAreaRecord]> =
            vec![EffectiveAreaRecord::from_row([2.0, 3.0, -10.0, 10.0, 1.0])].into();
        let store = RecordStore::new(Detector::IceCube)
            .with_year(4, YearRecords::new(Arc::clone(&shared), Arc::new([])))
            .with_year(5, YearRecords::new(Arc::clone(&shared), Arc::new([])));

        let first = store.year(4).expect("year 4");
        let second = store.year(5).expect("year 5");
        assert!(Arc::ptr_eq(&first.effective_area, &second.effective_area));
    }
}
