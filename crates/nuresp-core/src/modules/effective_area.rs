use crate::domain::{CellGrid, NurespResult, Year};
use crate::modules::binning::{BinAxis, joint_matches, match_masks, zenith_to_declination};
use crate::modules::records::{EffectiveAreaRecord, RecordStore};
use tracing::{debug, warn};

pub type EffectiveAreaGrid = CellGrid<Vec<f64>>;

#[derive(Debug, Clone, Copy)]
pub struct EffectiveAreaEvaluator<'a> {
    store: &'a RecordStore,
}

impl<'a> EffectiveAreaEvaluator<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// `energies` are in GeV and `thetas` are zenith angles in degrees.
    pub fn evaluate(
        &self,
        energies: &[f64],
        thetas: &[f64],
        year: Year,
    ) -> NurespResult<EffectiveAreaGrid> {
        let records = &self.store.year(year)?.effective_area;
        Ok(evaluate_effective_area(records, energies, thetas))
    }
}

pub fn evaluate_effective_area(
    records: &[EffectiveAreaRecord],
    energies: &[f64],
    thetas: &[f64],
) -> EffectiveAreaGrid {
    let log_energies = energies.iter().map(|energy| energy.log10()).collect::<Vec<_>>();
    let declinations = thetas
        .iter()
        .map(|theta| zenith_to_declination(*theta))
        .collect::<Vec<_>>();

    debug!(
        energies = energies.len(),
        angles = thetas.len(),
        records = records.len(),
        "building effective area masks"
    );
    let energy_masks = match_masks(records, BinAxis::Energy, &log_energies);
    let angle_masks = match_masks(records, BinAxis::Declination, &declinations);

    CellGrid::from_fn(thetas.len(), energies.len(), |angle_index, energy_index| {
        joint_matches(&energy_masks[energy_index], &angle_masks[angle_index])
            .into_iter()
            .map(|record_index| records[record_index].aeff)
            .collect()
    })
}

/// Effective area applied to a cell: the first match in record order, zero when empty.
pub fn cell_effective_area(matches: &[f64]) -> f64 {
    matches.first().copied().unwrap_or(0.0)
}

pub fn count_ambiguous_cells(grid: &EffectiveAreaGrid) -> usize {
    grid.iter().filter(|(_, matches)| matches.len() > 1).count()
}

pub(crate) fn warn_on_ambiguous_cells(grid: &EffectiveAreaGrid, year: Year) {
    let ambiguous = count_ambiguous_cells(grid);
    if ambiguous > 0 {
        warn!(
            year,
            cells = ambiguous,
            "overlapping effective-area bins; using the first matching record per cell"
        );
    }
}
