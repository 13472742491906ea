use crate::common::constants::RIGHT_ANGLE_DEG;
use crate::modules::records::{BinnedRecord, TrueBin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinAxis {
    /// log10(E/GeV)
    Energy,
    /// degrees
    Declination,
}

impl BinAxis {
    pub const fn bounds(self, bin: &TrueBin) -> (f64, f64) {
        match self {
            Self::Energy => (bin.e_min, bin.e_max),
            Self::Declination => (bin.dec_min, bin.dec_max),
        }
    }
}

/// Half-open containment `lower <= query < upper`.
pub fn bin_contains(lower: f64, upper: f64, query: f64) -> bool {
    lower <= query && query < upper
}

pub fn match_mask<R: BinnedRecord>(records: &[R], axis: BinAxis, query: f64) -> Vec<bool> {
    records
        .iter()
        .map(|record| {
            let (lower, upper) = axis.bounds(record.true_bin());
            bin_contains(lower, upper, query)
        })
        .collect()
}

pub fn match_masks<R: BinnedRecord>(records: &[R], axis: BinAxis, queries: &[f64]) -> Vec<Vec<bool>> {
    queries
        .iter()
        .map(|query| match_mask(records, axis, *query))
        .collect()
}

pub fn joint_matches(lhs: &[bool], rhs: &[bool]) -> Vec<usize> {
    lhs.iter()
        .zip(rhs)
        .enumerate()
        .filter_map(|(index, (left, right))| (*left && *right).then_some(index))
        .collect()
}

/// Zenith angle in [0, 180] degrees to declination in [-90, 90] degrees.
pub fn zenith_to_declination(theta: f64) -> f64 {
    if theta < RIGHT_ANGLE_DEG {
        -(RIGHT_ANGLE_DEG - theta)
    } else {
        theta - RIGHT_ANGLE_DEG
    }
}
