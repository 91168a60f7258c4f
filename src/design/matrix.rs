//! Design output tables

use serde::{Deserialize, Serialize};

use super::WellPosition;
use crate::table::{Column, Dataset, Value};
use crate::Result;

use arrow::record_batch::RecordBatch;

/// Combination identifier column.
pub const ID_COLUMN: &str = "ID";
/// Plate number column (only with a plate format).
pub const PLATE_COLUMN: &str = "Plate";
/// Well name column (only with a plate format).
pub const WELL_COLUMN: &str = "Well";
/// Diluent volume column of the experiment matrix.
pub const DILUENT_VOLUME_COLUMN: &str = "Diluent volume";
/// Total volume column of the experiment matrix.
pub const TOTAL_VOLUME_COLUMN: &str = "Total volume";
/// Diluent column of the volume matrix.
pub const DILUENT_COLUMN: &str = "Diluent";

/// Experiment-matrix column holding the pipetting volume for `factor`.
#[must_use]
pub fn volume_column(factor: &str) -> String {
    format!("{factor} volume")
}

/// One combination of factor levels with its volumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRow {
    /// 1-based index of the combination in the full factorial enumeration
    pub id: usize,
    /// Assigned well, when a plate format is configured
    pub well: Option<WellPosition>,
    /// One level per factor, in factor order
    pub levels: Vec<Value>,
    /// One volume per stocked factor, in factor order
    pub reagent_volumes: Vec<f64>,
    /// Fill volume bringing the well to the final volume
    pub diluent_volume: f64,
}

impl ExperimentRow {
    /// Reagent volumes plus diluent.
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        self.reagent_volumes.iter().sum::<f64>() + self.diluent_volume
    }
}

/// Presentation table of a factorial design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentMatrix {
    factor_names: Vec<String>,
    reagent_names: Vec<String>,
    final_volume: f64,
    rows: Vec<ExperimentRow>,
}

impl ExperimentMatrix {
    pub(crate) const fn new(
        factor_names: Vec<String>,
        reagent_names: Vec<String>,
        final_volume: f64,
        rows: Vec<ExperimentRow>,
    ) -> Self {
        Self {
            factor_names,
            reagent_names,
            final_volume,
            rows,
        }
    }

    /// Factor columns in order.
    #[must_use]
    pub fn factor_names(&self) -> &[String] {
        &self.factor_names
    }

    /// Factors that received a pipetting volume.
    #[must_use]
    pub fn reagent_names(&self) -> &[String] {
        &self.reagent_names
    }

    /// Configured final volume per well.
    #[must_use]
    pub const fn final_volume(&self) -> f64 {
        self.final_volume
    }

    /// Rows in enumeration order.
    #[must_use]
    pub fn rows(&self) -> &[ExperimentRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no row survived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Level of `factor` in row `row`.
    #[must_use]
    pub fn level(&self, row: usize, factor: &str) -> Option<&Value> {
        let index = self.factor_names.iter().position(|n| n == factor)?;
        self.rows.get(row).map(|r| &r.levels[index])
    }

    /// Pipetting view of the same rows.
    #[must_use]
    pub fn volume_matrix(&self) -> VolumeMatrix {
        VolumeMatrix {
            reagent_names: self.reagent_names.clone(),
            rows: self
                .rows
                .iter()
                .map(|row| VolumeRow {
                    id: row.id,
                    reagent_volumes: row.reagent_volumes.clone(),
                    diluent_volume: row.diluent_volume,
                })
                .collect(),
        }
    }

    /// Flatten to a dataset: `ID`, optional `Plate`/`Well`, factor columns,
    /// `"<factor> volume"` per reagent, `Diluent volume`, `Total volume`.
    ///
    /// # Errors
    /// Returns error if a factor name collides with a derived column name.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_dataset(&self) -> Result<Dataset> {
        let mut dataset = Dataset::new();
        dataset.push_column(
            ID_COLUMN,
            Column::Numeric(self.rows.iter().map(|r| r.id as f64).collect()),
        )?;

        if self.rows.iter().any(|r| r.well.is_some()) {
            let wells: Vec<_> = self
                .rows
                .iter()
                .map(|r| r.well.clone().unwrap_or_default())
                .collect();
            dataset.push_column(
                PLATE_COLUMN,
                Column::Numeric(wells.iter().map(|w| w.plate as f64).collect()),
            )?;
            dataset.push_column(
                WELL_COLUMN,
                Column::Categorical(wells.into_iter().map(|w| w.well).collect()),
            )?;
        }

        for (index, name) in self.factor_names.iter().enumerate() {
            let values = self.rows.iter().map(|r| r.levels[index].clone()).collect();
            dataset.push_column(name.clone(), Column::from_values(values))?;
        }

        for (index, name) in self.reagent_names.iter().enumerate() {
            let volumes = self.rows.iter().map(|r| r.reagent_volumes[index]).collect();
            dataset.push_column(volume_column(name), Column::Numeric(volumes))?;
        }

        dataset.push_column(
            DILUENT_VOLUME_COLUMN,
            Column::Numeric(self.rows.iter().map(|r| r.diluent_volume).collect()),
        )?;
        dataset.push_column(
            TOTAL_VOLUME_COLUMN,
            Column::Numeric(self.rows.iter().map(ExperimentRow::total_volume).collect()),
        )?;
        Ok(dataset)
    }

    /// Arrow form of [`to_dataset`](Self::to_dataset).
    ///
    /// # Errors
    /// See [`to_dataset`](Self::to_dataset).
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        self.to_dataset()?.to_record_batch()
    }
}

/// Volumes of one row for the liquid handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRow {
    /// Combination identifier, matching [`ExperimentRow::id`]
    pub id: usize,
    /// One volume per reagent
    pub reagent_volumes: Vec<f64>,
    /// Fill volume
    pub diluent_volume: f64,
}

impl VolumeRow {
    /// Reagent volumes plus diluent.
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        self.reagent_volumes.iter().sum::<f64>() + self.diluent_volume
    }
}

/// Per-reagent and diluent volumes, one row per well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeMatrix {
    reagent_names: Vec<String>,
    rows: Vec<VolumeRow>,
}

impl VolumeMatrix {
    /// Reagent columns in order.
    #[must_use]
    pub fn reagent_names(&self) -> &[String] {
        &self.reagent_names
    }

    /// Rows in design order.
    #[must_use]
    pub fn rows(&self) -> &[VolumeRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total volume of each reagent (and diluent, last) across all wells,
    /// for preparing enough stock.
    #[must_use]
    pub fn totals(&self) -> Vec<(String, f64)> {
        let mut totals: Vec<(String, f64)> = self
            .reagent_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), self.rows.iter().map(|r| r.reagent_volumes[i]).sum()))
            .collect();
        totals.push((
            DILUENT_COLUMN.to_string(),
            self.rows.iter().map(|r| r.diluent_volume).sum(),
        ));
        totals
    }

    /// Flatten to a dataset: `ID`, one column per reagent, `Diluent`.
    ///
    /// # Errors
    /// Returns error if a reagent name collides with `ID` or `Diluent`.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_dataset(&self) -> Result<Dataset> {
        let mut dataset = Dataset::new();
        dataset.push_column(
            ID_COLUMN,
            Column::Numeric(self.rows.iter().map(|r| r.id as f64).collect()),
        )?;
        for (index, name) in self.reagent_names.iter().enumerate() {
            let volumes = self.rows.iter().map(|r| r.reagent_volumes[index]).collect();
            dataset.push_column(name.clone(), Column::Numeric(volumes))?;
        }
        dataset.push_column(
            DILUENT_COLUMN,
            Column::Numeric(self.rows.iter().map(|r| r.diluent_volume).collect()),
        )?;
        Ok(dataset)
    }

    /// Arrow form of [`to_dataset`](Self::to_dataset).
    ///
    /// # Errors
    /// See [`to_dataset`](Self::to_dataset).
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        self.to_dataset()?.to_record_batch()
    }
}
