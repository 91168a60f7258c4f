//! Integration tests for factorial design generation

use approx::assert_relative_eq;
use arrow::array::{Array, Float64Array, StringArray};
use scout_doe::config::{CapacityPolicy, EngineConfig};
use scout_doe::design::{
    ExperimentDesignBuilder, PlateFormat, DILUENT_COLUMN, ID_COLUMN, TOTAL_VOLUME_COLUMN,
};
use scout_doe::project::{Factor, FactorSet};
use scout_doe::table::Value;
use scout_doe::Error;

fn screen() -> FactorSet {
    let mut factors = FactorSet::new();
    factors.add_from_catalog("buffer pH", "7.0, 7.5, 8.0", None).unwrap();
    factors.add_from_catalog("nacl", "100, 150, 200", Some(1000.0)).unwrap();
    factors
}

#[test]
fn test_ph_nacl_example() {
    let design = ExperimentDesignBuilder::new(100.0).unwrap().build(&screen()).unwrap();
    assert_eq!(design.matrix.len(), 9);
    assert_eq!(design.volumes.len(), 9);

    let row = design
        .matrix
        .rows()
        .iter()
        .find(|r| r.levels == vec![Value::from("7.5"), Value::from(150.0)])
        .unwrap();
    assert_relative_eq!(row.reagent_volumes[0], 15.0, epsilon = 1e-9);
    assert_relative_eq!(row.diluent_volume, 85.0, epsilon = 1e-9);
    assert_relative_eq!(row.total_volume(), 100.0, epsilon = 1e-9);
}

#[test]
fn test_categorical_levels_keep_spelling() {
    let design = ExperimentDesignBuilder::new(100.0).unwrap().build(&screen()).unwrap();
    let data = design.matrix.to_dataset().unwrap();
    assert_eq!(data.labels("buffer pH").unwrap()[0], "7.0");
}

#[test]
fn test_rows_are_unique() {
    let mut factors = screen();
    factors
        .add(Factor::categorical("detergent", ["none", "DDM", "CHAPS"]).unwrap())
        .unwrap();
    let design = ExperimentDesignBuilder::new(200.0).unwrap().build(&factors).unwrap();
    assert_eq!(design.matrix.len(), 27);

    let mut seen: Vec<String> = design
        .matrix
        .rows()
        .iter()
        .map(|r| format!("{:?}", r.levels))
        .collect();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 27);
}

#[test]
fn test_record_batch_export() {
    let design = ExperimentDesignBuilder::new(100.0).unwrap().build(&screen()).unwrap();
    let batch = design.matrix.to_record_batch().unwrap();
    assert_eq!(batch.num_rows(), 9);

    let ph = batch
        .column_by_name("buffer pH")
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(ph.value(0), "7.0");

    let total = batch
        .column_by_name(TOTAL_VOLUME_COLUMN)
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert!(total.iter().all(|v| v.is_some_and(|v| (v - 100.0).abs() < 1e-9)));
}

#[test]
fn test_volume_matrix_export() {
    let design = ExperimentDesignBuilder::new(100.0).unwrap().build(&screen()).unwrap();
    let batch = design.volumes.to_record_batch().unwrap();
    let names: Vec<_> = batch.schema().fields().iter().map(|f| f.name().clone()).collect();
    assert_eq!(names, vec![ID_COLUMN, "nacl", DILUENT_COLUMN]);
}

#[test]
fn test_config_drives_policy_and_plate() {
    let config = EngineConfig::builder()
        .capacity_policy(CapacityPolicy::SkipRow)
        .plate_format(PlateFormat::Wells96)
        .build()
        .unwrap();

    let mut factors = FactorSet::new();
    factors
        .add(Factor::numeric("Glycerol", [10.0, 40.0, 60.0]).unwrap().with_stock(50.0).unwrap())
        .unwrap();
    factors
        .add(Factor::numeric("NaCl", [500.0]).unwrap().with_stock(5000.0).unwrap())
        .unwrap();

    let design = ExperimentDesignBuilder::from_config(100.0, &config)
        .unwrap()
        .build(&factors)
        .unwrap();

    // 60 % glycerol from a 50 % stock cannot fit
    assert_eq!(design.matrix.len(), 2);
    assert_eq!(
        design.rejected.iter().map(|v| v.row).collect::<Vec<_>>(),
        vec![3]
    );
    assert_relative_eq!(design.rejected[0].required, 130.0, epsilon = 1e-9);
    assert_eq!(design.matrix.rows()[1].well.as_ref().unwrap().well, "B1");
}

#[test]
fn test_fail_fast_reports_first_offender() {
    let mut factors = FactorSet::new();
    factors
        .add(Factor::numeric("Glycerol", [10.0, 40.0, 60.0]).unwrap().with_stock(50.0).unwrap())
        .unwrap();
    factors
        .add(Factor::numeric("NaCl", [500.0]).unwrap().with_stock(5000.0).unwrap())
        .unwrap();

    let err = ExperimentDesignBuilder::new(100.0).unwrap().build(&factors).unwrap_err();
    match err {
        Error::Capacity {
            row,
            required,
            final_volume,
        } => {
            assert_eq!(row, 3);
            assert_relative_eq!(required, 130.0, epsilon = 1e-9);
            assert_relative_eq!(final_volume, 100.0);
        }
        other => panic!("expected capacity error, got {other}"),
    }
}

#[test]
fn test_removing_factor_changes_design() {
    let mut factors = screen();
    let before = ExperimentDesignBuilder::new(100.0).unwrap().build(&factors).unwrap();
    factors.remove("buffer pH").unwrap();
    let after = ExperimentDesignBuilder::new(100.0).unwrap().build(&factors).unwrap();
    assert_eq!(before.matrix.len(), 9);
    assert_eq!(after.matrix.len(), 3);
}
