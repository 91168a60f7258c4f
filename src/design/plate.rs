//! Microplate well assignment

use serde::{Deserialize, Serialize};

/// Standard SBS microplate formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateFormat {
    /// 8 × 12 wells
    Wells96,
    /// 16 × 24 wells
    Wells384,
}

/// Plate number and well name of one design row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellPosition {
    /// 1-based plate number
    pub plate: usize,
    /// Well name such as `"B3"`
    pub well: String,
}

impl PlateFormat {
    /// Number of rows (letters).
    #[must_use]
    pub const fn rows(self) -> usize {
        match self {
            Self::Wells96 => 8,
            Self::Wells384 => 16,
        }
    }

    /// Number of columns (numbers).
    #[must_use]
    pub const fn columns(self) -> usize {
        match self {
            Self::Wells96 => 12,
            Self::Wells384 => 24,
        }
    }

    /// Wells per plate.
    #[must_use]
    pub const fn capacity(self) -> usize {
        self.rows() * self.columns()
    }

    /// Position of the `index`-th well (0-based), filling column by column
    /// (`A1, B1, …, H1, A2, …`) and rolling onto the next plate when full.
    #[must_use]
    pub fn well(self, index: usize) -> WellPosition {
        let plate = index / self.capacity() + 1;
        let offset = index % self.capacity();
        let row = offset % self.rows();
        let column = offset / self.rows() + 1;
        // rows() <= 16, so the letter stays within A..=P
        let letter = char::from(b'A' + u8::try_from(row).unwrap_or(0));
        WellPosition {
            plate,
            well: format!("{letter}{column}"),
        }
    }
}
