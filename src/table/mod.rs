//! Tabular data shared by the design, analysis and optimization components
//!
//! ## Layout
//!
//! ```text
//! Dataset ──< Column (Numeric | Categorical)
//!                 └── Value (Number | Text) per cell
//! ```
//!
//! A [`Dataset`] converts to and from an Arrow `RecordBatch`, which is what
//! ingestion and export collaborators hand over.

mod arrow_interop;
mod dataset;
mod value;

pub use dataset::{Column, Dataset};
pub use value::Value;
