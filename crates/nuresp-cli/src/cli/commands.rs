use super::CliError;
use super::helpers::print_json;
use nuresp_core::common::NurespConfig;
use nuresp_core::common::constants::SECONDS_PER_DAY;
use nuresp_core::domain::{NurespError, Year};
use nuresp_core::modules::records::EventRecord;
use nuresp_core::modules::{
    FileRecordLoader, ResponseReader, run_config_path, total_livetime_seconds, yearly_livetime,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct BuildArgs {
    /// Table cache path; overrides the configured one
    #[arg(long)]
    output: Option<PathBuf>,

    /// Ignore any existing table cache
    #[arg(long)]
    rebuild: bool,

    /// Number of seasons to build; overrides the configured count
    #[arg(long)]
    years: Option<u32>,
}

#[derive(clap::Args)]
pub(super) struct InspectArgs {
    /// Season index
    #[arg(long, default_value_t = 0)]
    year: Year,

    /// Print the density of one (angle index, energy index) cell
    #[arg(long, num_args = 2, value_names = ["ANGLE", "ENERGY"])]
    cell: Option<Vec<usize>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildSummary {
    detector: String,
    source: &'static str,
    tables_path: PathBuf,
    run_config_path: PathBuf,
    shape: [usize; 3],
    years: Vec<YearSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct YearSummary {
    year: Year,
    nonzero_cells: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TableSummary {
    year: Year,
    source: &'static str,
    shape: [usize; 3],
    nonzero_cells: usize,
    max_value: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CellReport {
    year: Year,
    angle_index: usize,
    energy_index: usize,
    theta_deg: f64,
    energy_gev: f64,
    unified_grid: Vec<f64>,
    values: Vec<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LivetimeReport {
    years: Vec<YearLivetime>,
    total_seconds: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct YearLivetime {
    year: Year,
    seconds: f64,
    days: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventSummary {
    year: Year,
    events: usize,
    first_mjd: Option<f64>,
    last_mjd: Option<f64>,
    min_log10_energy: Option<f64>,
    max_log10_energy: Option<f64>,
    livetime_seconds: f64,
}

pub(super) fn run_build_command(mut config: NurespConfig, args: BuildArgs) -> Result<i32, CliError> {
    if let Some(output) = args.output {
        config.cache.tables = output;
    }
    if let Some(years) = args.years {
        config.grid.years = years;
    }
    config.cache.precomputed = !args.rebuild;
    config.cache.store = true;

    let reader = ResponseReader::from_config(config).map_err(CliError::Compute)?;
    let (angles, energies, unified) = reader.grids().table_shape();
    let summary = BuildSummary {
        detector: reader.config().general.detector.to_string(),
        source: reader.source().as_str(),
        tables_path: reader.config().cache.tables.clone(),
        run_config_path: run_config_path(&reader.config().cache.tables),
        shape: [angles, energies, unified],
        years: reader
            .conversion_tables()
            .iter()
            .map(|(year, table)| YearSummary {
                year: *year,
                nonzero_cells: table.nonzero_cells(),
            })
            .collect(),
    };
    print_json(&summary)?;
    Ok(0)
}

pub(super) fn run_inspect_command(config: NurespConfig, args: InspectArgs) -> Result<i32, CliError> {
    let reader = ResponseReader::from_config(config).map_err(CliError::Compute)?;
    let table = reader.table(args.year).map_err(CliError::Compute)?;

    let Some(cell) = args.cell else {
        let (angles, energies, unified) = table.shape();
        let summary = TableSummary {
            year: args.year,
            source: reader.source().as_str(),
            shape: [angles, energies, unified],
            nonzero_cells: table.nonzero_cells(),
            max_value: table.values().iter().copied().fold(0.0, f64::max),
        };
        print_json(&summary)?;
        return Ok(0);
    };

    let &[angle_index, energy_index] = cell.as_slice() else {
        return Err(CliError::Usage("--cell takes ANGLE and ENERGY indices".to_string()));
    };
    let grids = reader.grids();
    let (Some(values), Some(theta), Some(energy)) = (
        table.cell(angle_index, energy_index),
        grids.thetas.get(angle_index),
        grids.energies.get(energy_index),
    ) else {
        let (angles, energies, _) = table.shape();
        return Err(CliError::Compute(NurespError::input_validation(
            "INPUT.CLI_CELL",
            format!(
                "cell ({}, {}) is outside the {} x {} table",
                angle_index, energy_index, angles, energies
            ),
        )));
    };

    print_json(&CellReport {
        year: args.year,
        angle_index,
        energy_index,
        theta_deg: *theta,
        energy_gev: *energy,
        unified_grid: grids.unified_grid.clone(),
        values: values.to_vec(),
    })?;
    Ok(0)
}

pub(super) fn run_livetime_command(config: NurespConfig) -> Result<i32, CliError> {
    let loader = FileRecordLoader::new(config.general.detector, config.data);
    let livetime =
        yearly_livetime(&loader, &config.grid.years()).map_err(CliError::Compute)?;

    let report = LivetimeReport {
        total_seconds: livetime.values().sum(),
        years: livetime
            .into_iter()
            .map(|(year, seconds)| YearLivetime {
                year,
                seconds,
                days: seconds / SECONDS_PER_DAY,
            })
            .collect(),
    };
    print_json(&report)?;
    Ok(0)
}

pub(super) fn run_data_summary_command(config: NurespConfig) -> Result<i32, CliError> {
    let loader = FileRecordLoader::new(config.general.detector, config.data);
    let mut summaries = Vec::new();
    for year in config.grid.years() {
        let events = loader.load_events(year).map_err(CliError::Compute)?;
        let uptime = loader.load_uptime(year).map_err(CliError::Compute)?;
        summaries.push(summarize_events(year, &events, total_livetime_seconds(&uptime)));
    }
    print_json(&summaries)?;
    Ok(0)
}

fn summarize_events(year: Year, events: &[EventRecord], livetime_seconds: f64) -> EventSummary {
    let mjd = extent(events.iter().map(|event| event.mjd));
    let energy = extent(events.iter().map(|event| event.log10_energy));

    EventSummary {
        year,
        events: events.len(),
        first_mjd: mjd.map(|(low, _)| low),
        last_mjd: mjd.map(|(_, high)| high),
        min_log10_energy: energy.map(|(low, _)| low),
        max_log10_energy: energy.map(|(_, high)| high),
        livetime_seconds,
    }
}

fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None::<(f64, f64)>, |range, value| match range {
        Some((low, high)) => Some((f64::min(low, value), f64::max(high, value))),
        None => Some((value, value)),
    })
}
