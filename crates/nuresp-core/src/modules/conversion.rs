use crate::domain::{NurespError, NurespResult, TableGrids, Year};
use crate::modules::effective_area::{
    EffectiveAreaEvaluator, EffectiveAreaGrid, cell_effective_area, warn_on_ambiguous_cells,
};
use crate::modules::records::RecordStore;
use crate::modules::smearing::SmearingAggregator;
use crate::modules::spline::{ResponseSpline, ResponseSplineBuilder};
use crate::numerics::{stable_sum, trapezoid};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionTable {
    year: Year,
    shape: [usize; 3],
    values: Vec<f64>,
}

impl ConversionTable {
    pub fn from_cells(
        year: Year,
        shape: (usize, usize, usize),
        cells: Vec<Vec<f64>>,
    ) -> NurespResult<Self> {
        let (angles, energies, unified) = shape;
        if cells.len() != angles * energies || cells.iter().any(|cell| cell.len() != unified) {
            return Err(NurespError::internal(
                "SYS.TABLE_SHAPE",
                format!(
                    "year {} table cells do not form a ({}, {}, {}) table",
                    year, angles, energies, unified
                ),
            ));
        }

        Ok(Self {
            year,
            shape: [angles, energies, unified],
            values: cells.into_iter().flatten().collect(),
        })
    }

    pub const fn year(&self) -> Year {
        self.year
    }

    pub const fn shape(&self) -> (usize, usize, usize) {
        (self.shape[0], self.shape[1], self.shape[2])
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn cell(&self, angle_index: usize, energy_index: usize) -> Option<&[f64]> {
        let [angles, energies, unified] = self.shape;
        if angle_index >= angles || energy_index >= energies {
            return None;
        }
        let start = (angle_index * energies + energy_index) * unified;
        self.values.get(start..start + unified)
    }

    pub fn is_consistent(&self) -> bool {
        let [angles, energies, unified] = self.shape;
        angles
            .checked_mul(energies)
            .and_then(|cells| cells.checked_mul(unified))
            .is_some_and(|len| len == self.values.len())
    }

    pub fn nonzero_cells(&self) -> usize {
        let [angles, energies, _] = self.shape;
        (0..angles)
            .flat_map(|angle| (0..energies).map(move |energy| (angle, energy)))
            .filter(|(angle, energy)| {
                self.cell(*angle, *energy)
                    .is_some_and(|cell| cell.iter().any(|value| *value > 0.0))
            })
            .count()
    }
}

/// Outcome of a multi-year build; a failing year never discards the others.
#[derive(Debug, Default)]
pub struct YearlyBuild {
    pub tables: BTreeMap<Year, ConversionTable>,
    pub failures: BTreeMap<Year, NurespError>,
}

impl YearlyBuild {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_result(self) -> NurespResult<BTreeMap<Year, ConversionTable>> {
        match self.failures.into_iter().next() {
            Some((_, error)) => Err(error),
            None => Ok(self.tables),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConversionTableBuilder<'a> {
    store: &'a RecordStore,
}

impl<'a> ConversionTableBuilder<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    pub fn build(&self, grids: &TableGrids, year: Year) -> NurespResult<ConversionTable> {
        grids.validate()?;
        self.store.year(year)?;

        debug!(year, "evaluating effective areas");
        let effective_area =
            EffectiveAreaEvaluator::new(self.store).evaluate(&grids.energies, &grids.thetas, year)?;
        warn_on_ambiguous_cells(&effective_area, year);

        debug!(year, "aggregating smearing matrix");
        let histograms =
            SmearingAggregator::new(self.store).aggregate(&grids.energies, &grids.thetas, year)?;
        let splines = ResponseSplineBuilder.build(&histograms);

        let (angles, energies) = effective_area.shape();
        let mut cells = Vec::with_capacity(angles * energies);
        for angle_index in 0..angles {
            for energy_index in 0..energies {
                cells.push(normalized_cell(
                    &effective_area,
                    splines.get(angle_index, energy_index),
                    &grids.unified_grid,
                    (angle_index, energy_index),
                ));
            }
        }

        ConversionTable::from_cells(year, grids.table_shape(), cells)
    }

    pub fn build_years(&self, grids: &TableGrids, years: &[Year]) -> YearlyBuild {
        info!(years = years.len(), "generating conversion tables");
        let outcomes = years
            .par_iter()
            .map(|&year| (year, self.build(grids, year)))
            .collect::<Vec<_>>();

        let mut build = YearlyBuild::default();
        for (year, outcome) in outcomes {
            match outcome {
                Ok(table) => {
                    debug!(year, nonzero = table.nonzero_cells(), "conversion table ready");
                    build.tables.insert(year, table);
                }
                Err(error) => {
                    warn!(year, %error, "conversion table failed");
                    build.failures.insert(year, error);
                }
            }
        }
        build
    }
}

fn normalized_cell(
    effective_area: &EffectiveAreaGrid,
    spline: Option<&ResponseSpline>,
    unified_grid: &[f64],
    (angle_index, energy_index): (usize, usize),
) -> Vec<f64> {
    let zeros = vec![0.0; unified_grid.len()];
    let aeff = effective_area
        .get(angle_index, energy_index)
        .map(|matches| cell_effective_area(matches))
        .unwrap_or(0.0);
    let Some(spline) = spline else {
        return zeros;
    };

    let density = spline.evaluate(unified_grid);
    normalize_density(&density, unified_grid, aeff).unwrap_or(zeros)
}

/// `density / trapz(density) * aeff`, or `None` when the density carries no mass
/// over `unified_grid` or the result would not be finite and non-negative.
pub fn normalize_density(density: &[f64], unified_grid: &[f64], aeff: f64) -> Option<Vec<f64>> {
    if stable_sum(density) <= 0.0 {
        return None;
    }
    let integral = trapezoid(density, unified_grid)?;
    if !integral.is_finite() || integral <= 0.0 {
        return None;
    }

    let scaled = density
        .iter()
        .map(|value| value / integral * aeff)
        .collect::<Vec<_>>();
    scaled
        .iter()
        .all(|value| value.is_finite() && *value >= 0.0)
        .then_some(scaled)
}

#[cfg(test)]
mod tests {
    use super::{ConversionTable, ConversionTableBuilder, normalize_density};
    use crate::domain::{Detector, NurespErrorCategory, TableGrids};
    use crate::modules::records::{
        EffectiveAreaRecord, RecordStore, SmearingRecord, YearRecords,
    };
    use crate::numerics::trapezoid;

    fn smearing(e_rec_min: f64, e_rec_max: f64, counts: f64) -> SmearingRecord {
        SmearingRecord::from_row([
            2.0, 3.0, -10.0, 10.0, e_rec_min, e_rec_max, 0.0, 1.0, 0.0, 1.0, counts,
        ])
    }

    fn year_records() -> YearRecords {
        YearRecords::from_vecs(
            vec![EffectiveAreaRecord::from_row([2.0, 3.0, -10.0, 10.0, 5.0])],
            vec![smearing(2.0, 2.2, 3.0), smearing(2.4, 2.6, 1.0)],
        )
    }

    fn store() -> RecordStore {
        RecordStore::new(Detector::IceCube)
            .with_year(0, year_records())
            .with_year(1, year_records())
    }

    fn grids(unified: Vec<f64>) -> TableGrids {
        TableGrids::new(unified, vec![10f64.powf(2.5)], vec![90.0])
    }

    #[test]
    fn single_cell_is_normalized_and_scaled_by_effective_area() {
        let store = store();
        let table = ConversionTableBuilder::new(&store)
            .build(&grids(vec![2.1, 2.5]), 0)
            .expect("table should build");

        assert_eq!(table.shape(), (1, 1, 2));
        let cell = table.cell(0, 0).expect("cell");
        assert!((cell[0] - 18.75).abs() < 1.0e-9);
        assert!((cell[1] - 6.25).abs() < 1.0e-9);
        assert!((cell[0] / cell[1] - 3.0).abs() < 1.0e-9);

        let unit = cell.iter().map(|value| value / 5.0).collect::<Vec<_>>();
        let integral = trapezoid(&unit, &[2.1, 2.5]).expect("equal lengths");
        assert!((integral - 1.0).abs() < 1.0e-9);
    }

    #[test]
    fn table_shape_follows_the_grids() {
        let store = store();
        let grids = TableGrids::new(
            vec![1.0, 2.1, 2.3, 2.5, 4.0],
            vec![10f64.powf(2.5), 10f64.powf(4.5), 50.0],
            vec![0.0, 90.0, 135.0, 179.0],
        );
        let table = ConversionTableBuilder::new(&store)
            .build(&grids, 1)
            .expect("table should build");

        assert_eq!(table.shape(), (4, 3, 5));
        assert!(table.is_consistent());
        assert!(table.values().iter().all(|value| value.is_finite() && *value >= 0.0));
        assert_eq!(table.nonzero_cells(), 1);
    }

    #[test]
    fn cells_without_effective_area_are_zero() {
        let store = RecordStore::new(Detector::IceCube).with_year(
            0,
            YearRecords::from_vecs(
                vec![EffectiveAreaRecord::from_row([5.0, 6.0, -10.0, 10.0, 5.0])],
                vec![smearing(2.0, 2.2, 3.0), smearing(2.4, 2.6, 1.0)],
            ),
        );
        let table = ConversionTableBuilder::new(&store)
            .build(&grids(vec![2.1, 2.3, 2.5]), 0)
            .expect("table should build");

        assert_eq!(table.cell(0, 0), Some(&[0.0, 0.0, 0.0][..]));
    }

    #[test]
    fn unified_grid_outside_histogram_yields_zero_vector() {
        let store = store();
        let table = ConversionTableBuilder::new(&store)
            .build(&grids(vec![3.0, 3.5, 4.0]), 0)
            .expect("table should build");

        assert_eq!(table.cell(0, 0), Some(&[0.0, 0.0, 0.0][..]));
    }

    #[test]
    fn identical_years_produce_identical_tables() {
        let store = store();
        let build = ConversionTableBuilder::new(&store).build_years(&grids(vec![2.1, 2.5]), &[0, 1]);

        assert!(build.is_complete());
        let first = &build.tables[&0];
        let second = &build.tables[&1];
        assert_eq!(first.values(), second.values());
        assert_eq!(second.year(), 1);
    }

    #[test]
    fn failing_year_does_not_abort_the_others() {
        let store = store();
        let build = ConversionTableBuilder::new(&store).build_years(&grids(vec![2.1, 2.5]), &[0, 7]);

        assert!(!build.is_complete());
        assert!(build.tables.contains_key(&0));
        assert_eq!(
            build.failures[&7].category(),
            NurespErrorCategory::InputValidationError
        );
        assert!(build.into_result().is_err());
    }

    #[test]
    fn invalid_grids_are_rejected_before_evaluation() {
        let store = store();
        let builder = ConversionTableBuilder::new(&store);

        let error = builder
            .build(&grids(vec![2.5, 2.1]), 0)
            .expect_err("decreasing unified grid");
        assert_eq!(error.placeholder(), "INPUT.UNIFIED_GRID");

        let error = builder
            .build(&TableGrids::new(vec![2.1, 2.5], vec![-1.0], vec![90.0]), 0)
            .expect_err("negative energy");
        assert_eq!(error.placeholder(), "INPUT.ENERGY_GRID");

        let error = builder
            .build(&TableGrids::new(vec![2.1, 2.5], vec![100.0], vec![190.0]), 0)
            .expect_err("zenith out of range");
        assert_eq!(error.placeholder(), "INPUT.ZENITH_GRID");
    }

    #[test]
    fn uneven_smearing_groups_surface_as_computation_errors() {
        let mut records = year_records();
        records.smearing = vec![
            smearing(2.0, 2.2, 1.0),
            smearing(2.0, 2.2, 1.0),
            smearing(2.4, 2.6, 1.0),
        ]
        .into();
        let store = RecordStore::new(Detector::IceCube).with_year(3, records);

        let error = ConversionTableBuilder::new(&store)
            .build(&grids(vec![2.1, 2.5]), 3)
            .expect_err("uneven groups");
        assert_eq!(error.category(), NurespErrorCategory::ComputationError);
        assert!(error.message().contains("year 3"));
    }

    #[test]
    fn normalization_integrates_to_one() {
        let grid = [0.0, 0.5, 1.0, 1.5, 2.0];
        let density = [0.0, 1.0, 4.0, 1.0, 0.5];
        let normalized = normalize_density(&density, &grid, 1.0).expect("positive mass");
        let integral = trapezoid(&normalized, &grid).expect("equal lengths");
        assert!((integral - 1.0).abs() < 1.0e-9);

        assert!(normalize_density(&[0.0, 0.0], &[0.0, 1.0], 5.0).is_none());
        assert!(normalize_density(&[1.0], &[0.0], 5.0).is_none());
    }

    #[test]
    fn cells_must_match_declared_shape() {
        assert!(ConversionTable::from_cells(0, (1, 2, 2), vec![vec![0.0, 1.0]]).is_err());
        let table = ConversionTable::from_cells(0, (1, 2, 2), vec![vec![0.0, 1.0], vec![2.0, 3.0]])
            .expect("consistent cells");
        assert_eq!(table.cell(0, 1), Some(&[2.0, 3.0][..]));
        assert_eq!(table.cell(1, 0), None);
    }
}
