//! Factor catalog: display metadata for the factors a screen can vary
//!
//! The catalog is a static table. Factors outside it are still allowed in a
//! [`FactorSet`](crate::project::FactorSet); lookups for them fall back to
//! the raw key.
//!
//! ```rust
//! use scout_doe::catalog;
//!
//! let nacl = catalog::lookup("nacl").unwrap();
//! assert_eq!(nacl.display_name, "NaCl");
//! assert_eq!(catalog::label("nacl"), "NaCl (mM)");
//! assert_eq!(catalog::display_name("my additive"), "my additive");
//! ```

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::LazyLock;

use crate::roles::FactorRole;

/// Display metadata for one catalog factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FactorInfo {
    /// Lookup key
    pub key: &'static str,
    /// Human-readable name
    pub display_name: &'static str,
    /// Concentration unit, if any
    pub unit: Option<&'static str>,
    /// Whether levels are discrete labels rather than concentrations
    pub categorical: bool,
}

impl FactorInfo {
    /// Role implied by the categorical flag.
    #[must_use]
    pub const fn role(&self) -> FactorRole {
        if self.categorical {
            FactorRole::Categorical
        } else {
            FactorRole::Numeric
        }
    }
}

const fn numeric(key: &'static str, display_name: &'static str, unit: &'static str) -> FactorInfo {
    FactorInfo {
        key,
        display_name,
        unit: Some(unit),
        categorical: false,
    }
}

const fn categorical(key: &'static str, display_name: &'static str) -> FactorInfo {
    FactorInfo {
        key,
        display_name,
        unit: None,
        categorical: true,
    }
}

/// All catalog factors in presentation order.
pub static FACTORS: &[FactorInfo] = &[
    categorical("buffer pH", "Buffer pH"),
    numeric("buffer_conc", "Buffer Concentration", "mM"),
    numeric("nacl", "NaCl", "mM"),
    numeric("kcl", "KCl", "mM"),
    numeric("mgcl2", "MgCl2", "mM"),
    numeric("cacl2", "CaCl2", "mM"),
    numeric("zinc", "ZnCl2", "µM"),
    numeric("glycerol", "Glycerol", "%"),
    numeric("dmso", "DMSO", "%"),
    numeric("arginine", "L-Arginine", "mM"),
    numeric("sucrose", "Sucrose", "mM"),
    numeric("peg", "PEG 3350", "%"),
    numeric("edta", "EDTA", "mM"),
    categorical("detergent", "Detergent"),
    numeric("detergent_conc", "Detergent Concentration", "%"),
    categorical("reducing_agent", "Reducing Agent"),
    numeric("reducing_agent_conc", "Reducing Agent Concentration", "mM"),
];

static INDEX: LazyLock<FxHashMap<&'static str, &'static FactorInfo>> =
    LazyLock::new(|| FACTORS.iter().map(|info| (info.key, info)).collect());

/// Metadata for `key`.
#[must_use]
pub fn lookup(key: &str) -> Option<&'static FactorInfo> {
    INDEX.get(key).copied()
}

/// Whether `key` is a catalog factor.
#[must_use]
pub fn contains(key: &str) -> bool {
    INDEX.contains_key(key)
}

/// Display name for `key`, or `key` itself when it is not in the catalog.
#[must_use]
pub fn display_name(key: &str) -> &str {
    lookup(key).map_or(key, |info| info.display_name)
}

/// `"Name (unit)"` label for headers and legends.
#[must_use]
pub fn label(key: &str) -> String {
    match lookup(key) {
        Some(FactorInfo {
            display_name,
            unit: Some(unit),
            ..
        }) => format!("{display_name} ({unit})"),
        Some(info) => info.display_name.to_string(),
        None => key.to_string(),
    }
}

/// Role implied by the catalog (`None` for unknown keys).
#[must_use]
pub fn role_of(key: &str) -> Option<FactorRole> {
    lookup(key).map(FactorInfo::role)
}

/// Catalog keys in presentation order.
pub fn keys() -> impl Iterator<Item = &'static str> {
    FACTORS.iter().map(|info| info.key)
}

/// Catalog entries in presentation order.
pub fn entries() -> impl Iterator<Item = &'static FactorInfo> {
    FACTORS.iter()
}
