use crate::domain::{Detector, NurespResult, Year};
use crate::modules::records::{RecordStore, YearRecords};

pub trait RecordLoader {
    fn detector(&self) -> Detector;

    fn load_year(&self, year: Year) -> NurespResult<YearRecords>;

    fn load_store(&self, years: &[Year]) -> NurespResult<RecordStore> {
        let mut store = RecordStore::new(self.detector());
        for &year in years {
            store.insert(year, self.load_year(year)?);
        }
        Ok(store)
    }
}
