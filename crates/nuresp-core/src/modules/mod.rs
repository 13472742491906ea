pub mod binning;
pub mod cache;
pub mod conversion;
pub mod effective_area;
pub mod livetime;
pub mod reader;
pub mod records;
pub mod smearing;
pub mod spline;

mod traits;

pub use cache::{
    CacheMismatch, TableCache, read_tables, run_config_path, write_run_config, write_tables,
};
pub use conversion::{ConversionTable, ConversionTableBuilder, YearlyBuild};
pub use effective_area::{EffectiveAreaEvaluator, EffectiveAreaGrid};
pub use livetime::{total_livetime_seconds, yearly_livetime};
pub use reader::{ResponseReader, TableSource};
pub use records::{FileRecordLoader, RecordStore, YearRecords};
pub use smearing::{SmearingAggregator, SmearingHistograms, SmearingShapeError};
pub use spline::{ResponseSpline, ResponseSplineBuilder};
pub use traits::RecordLoader;
