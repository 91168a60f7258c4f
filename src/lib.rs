//! # Scout-DoE: Design-of-Experiments Engine for Protein Screening
//!
//! **Version**: 0.3.0
//!
//! Scout-DoE plans buffer and additive screens, characterizes what the
//! measured response depends on, and proposes the next experiments.
//!
//! ## Workflow
//!
//! ```text
//! FactorSet ──> ExperimentDesignBuilder ──> ExperimentMatrix + VolumeMatrix
//!                                                  │
//!                                           lab runs the plate
//!                                                  ▼
//!            RegressionEngine <────────── observed Dataset ──────────> BayesianOptimizer
//!        (effects, significance)                                    (suggest / report)
//! ```
//!
//! ## Design Principles
//!
//! - **Roles are declared**: categorical vs numeric is never guessed from
//!   content; one [`roles::FactorRoles`] drives formulas, encoding and bounds
//! - **No silent clamping**: a well that cannot hold its reagents is an
//!   [`Error::Capacity`] or an explicitly reported rejected row
//! - **Explicit sessions**: state lives in values the caller owns or in a
//!   [`session::SessionStore`], never in globals
//!
//! ## Example
//!
//! ```rust
//! use scout_doe::design::ExperimentDesignBuilder;
//! use scout_doe::project::FactorSet;
//!
//! # fn main() -> scout_doe::Result<()> {
//! let mut factors = FactorSet::new();
//! factors.add_from_catalog("buffer pH", "7.0, 7.5, 8.0", None)?;
//! factors.add_from_catalog("nacl", "100, 150, 200", Some(1000.0))?;
//!
//! let design = ExperimentDesignBuilder::new(100.0)?.build(&factors)?;
//! assert_eq!(design.matrix.len(), 9);
//! assert!(design.rejected.is_empty());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod design;
pub mod error;
pub mod optimize;
pub mod project;
pub mod roles;
pub mod session;
pub mod table;
pub mod telemetry;

pub use error::{Error, ErrorCategory, Result};
