pub mod config;
pub mod constants;

pub use config::{
    AngleRange, CacheConfig, ConfigError, DataConfig, EnergyBinning, GeneralConfig, GridConfig,
    NurespConfig, load_config,
};
