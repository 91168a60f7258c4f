//! Bayesian optimization of screening conditions
//!
//! ## Flow
//!
//! ```text
//! set_data ──> NameMapping (sanitize) + bounds per factor
//!     │
//! initialize(minimize) ──> SearchSpace ──> BackendProvider::create
//!     │                                      └─ historical rows observed
//!     ▼
//! suggest / suggest_batch ──> run experiment ──> report ──┐
//!     ▲                                                   │
//!     └───────────────────────────────────────────────────┘
//! ```
//!
//! Factor names are free text ("NaCl (mM)"); the backend only ever sees
//! sanitized identifiers ("NaCl_mM"). Translation happens at the session
//! boundary in both directions.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "bayes")]
//! # fn main() -> scout_doe::Result<()> {
//! use scout_doe::optimize::BayesianOptimizer;
//! use scout_doe::roles::FactorRoles;
//! use scout_doe::table::Dataset;
//!
//! let data = Dataset::new()
//!     .with_numeric("NaCl (mM)", vec![50.0, 100.0, 150.0, 200.0])?
//!     .with_numeric("Tm", vec![48.0, 52.5, 54.0, 53.0])?;
//!
//! let mut optimizer = BayesianOptimizer::new();
//! optimizer.set_data(&data, FactorRoles::numeric(["NaCl (mM)"])?, "Tm")?;
//! optimizer.initialize(false)?;
//!
//! let next = optimizer.suggest()?;
//! let nacl = next["NaCl (mM)"].as_f64().unwrap();
//! assert!((50.0..=200.0).contains(&nacl));
//!
//! optimizer.report(&next, 54.5)?;
//! assert_eq!(optimizer.best_observed().and_then(|t| t.response()), Some(54.5));
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "bayes"))]
//! # fn main() {}
//! ```

mod backend;
mod bounds;
#[cfg(feature = "bayes")]
mod gp;
mod optimizer;
mod sanitize;
mod trial;

pub use backend::{
    default_provider, Availability, BackendProvider, Objective, OptimizerBackend, ParameterSpec,
    Parameters, SearchSpace, UnavailableProvider,
};
pub use bounds::{compute_bounds, ParameterBounds};
#[cfg(feature = "bayes")]
pub use gp::{GaussianProcessBackend, GaussianProcessProvider};
pub use optimizer::{BayesianOptimizer, SessionState};
pub use sanitize::{sanitize, NameMapping};
pub use trial::{Trial, TrialSource};
