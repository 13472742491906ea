use crate::domain::{CellGrid, NurespError, NurespResult, Year};
use crate::modules::binning::{BinAxis, joint_matches, match_masks, zenith_to_declination};
use crate::modules::records::{RecordStore, SmearingRecord};
use crate::numerics::stable_sum;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct SmearingHistograms {
    pub values: CellGrid<Vec<f64>>,
    /// Sub-bin centers in log10(E_rec/GeV), parallel to `values`.
    pub centers: CellGrid<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SmearingShapeError {
    #[error(
        "year {year} cell (angle {angle_index}, energy {energy_index}): {records} smearing records do not split evenly over {sub_bins} reconstructed-energy sub-bins"
    )]
    UnevenGroups {
        year: Year,
        angle_index: usize,
        energy_index: usize,
        records: usize,
        sub_bins: usize,
    },
    #[error(
        "year {year} cell (angle {angle_index}, energy {energy_index}): reconstructed-energy sub-bin [{e_rec_min}, {e_rec_max}) holds {actual} records, expected {expected}"
    )]
    GroupSizeMismatch {
        year: Year,
        angle_index: usize,
        energy_index: usize,
        e_rec_min: f64,
        e_rec_max: f64,
        expected: usize,
        actual: usize,
    },
}

impl From<SmearingShapeError> for NurespError {
    fn from(error: SmearingShapeError) -> Self {
        NurespError::computation("RUN.SMEARING_SHAPE", error.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SmearingAggregator<'a> {
    store: &'a RecordStore,
}

impl<'a> SmearingAggregator<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    pub fn aggregate(
        &self,
        energies: &[f64],
        thetas: &[f64],
        year: Year,
    ) -> NurespResult<SmearingHistograms> {
        let records = &self.store.year(year)?.smearing;
        Ok(aggregate_smearing(records, energies, thetas, year)?)
    }
}

pub fn aggregate_smearing(
    records: &[SmearingRecord],
    energies: &[f64],
    thetas: &[f64],
    year: Year,
) -> Result<SmearingHistograms, SmearingShapeError> {
    let log_energies = energies.iter().map(|energy| energy.log10()).collect::<Vec<_>>();
    let declinations = thetas
        .iter()
        .map(|theta| zenith_to_declination(*theta))
        .collect::<Vec<_>>();

    debug!(
        year,
        energies = energies.len(),
        angles = thetas.len(),
        records = records.len(),
        "building smearing masks"
    );
    let energy_masks = match_masks(records, BinAxis::Energy, &log_energies);
    let angle_masks = match_masks(records, BinAxis::Declination, &declinations);

    let histograms = CellGrid::try_from_fn(
        thetas.len(),
        energies.len(),
        |angle_index, energy_index| {
            let matches = joint_matches(&energy_masks[energy_index], &angle_masks[angle_index]);
            sum_reconstructed_sub_bins(records, &matches).map_err(|shape| {
                shape.into_error(year, angle_index, energy_index)
            })
        },
    )?;

    Ok(SmearingHistograms {
        values: histograms.map(|(values, _)| values.clone()),
        centers: histograms.map(|(_, centers)| centers.clone()),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CellShapeFault {
    Uneven {
        records: usize,
        sub_bins: usize,
    },
    GroupSize {
        e_rec_min: f64,
        e_rec_max: f64,
        expected: usize,
        actual: usize,
    },
}

impl CellShapeFault {
    fn into_error(self, year: Year, angle_index: usize, energy_index: usize) -> SmearingShapeError {
        match self {
            Self::Uneven { records, sub_bins } => SmearingShapeError::UnevenGroups {
                year,
                angle_index,
                energy_index,
                records,
                sub_bins,
            },
            Self::GroupSize {
                e_rec_min,
                e_rec_max,
                expected,
                actual,
            } => SmearingShapeError::GroupSizeMismatch {
                year,
                angle_index,
                energy_index,
                e_rec_min,
                e_rec_max,
                expected,
                actual,
            },
        }
    }
}

struct SubBinGroup {
    e_rec_min: f64,
    e_rec_max: f64,
    center: f64,
    counts: Vec<f64>,
}

fn sum_reconstructed_sub_bins(
    records: &[SmearingRecord],
    matches: &[usize],
) -> Result<(Vec<f64>, Vec<f64>), CellShapeFault> {
    if matches.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let mut slots: BTreeMap<(u64, u64), usize> = BTreeMap::new();
    let mut groups: Vec<SubBinGroup> = Vec::new();
    for &record_index in matches {
        let record = &records[record_index];
        // +0.0 folds -0.0 onto 0.0 so both land in one sub-bin.
        let key = (
            (record.e_rec_min + 0.0).to_bits(),
            (record.e_rec_max + 0.0).to_bits(),
        );
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push(SubBinGroup {
                e_rec_min: record.e_rec_min,
                e_rec_max: record.e_rec_max,
                center: record.e_rec_center(),
                counts: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].counts.push(record.fractional_counts);
    }

    let sub_bins = groups.len();
    if matches.len() % sub_bins != 0 {
        return Err(CellShapeFault::Uneven {
            records: matches.len(),
            sub_bins,
        });
    }

    let group_size = matches.len() / sub_bins;
    if let Some(group) = groups.iter().find(|group| group.counts.len() != group_size) {
        return Err(CellShapeFault::GroupSize {
            e_rec_min: group.e_rec_min,
            e_rec_max: group.e_rec_max,
            expected: group_size,
            actual: group.counts.len(),
        });
    }

    let values = groups.iter().map(|group| stable_sum(&group.counts)).collect();
    let centers = groups.iter().map(|group| group.center).collect();
    Ok((values, centers))
}
