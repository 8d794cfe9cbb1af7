use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a single panorama predicate constrains acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredicateOption {
    /// No constraint.
    #[default]
    Ignore,
    /// The predicate must hold.
    Require,
    /// The predicate must not hold.
    Reject,
}

impl PredicateOption {
    /// Applies the constraint to an already-evaluated predicate.
    #[must_use]
    pub fn admits(self, value: bool) -> bool {
        match self {
            PredicateOption::Ignore => true,
            PredicateOption::Require => value,
            PredicateOption::Reject => !value,
        }
    }

    #[must_use]
    pub fn is_ignore(self) -> bool {
        self == PredicateOption::Ignore
    }
}

impl std::fmt::Display for PredicateOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredicateOption::Ignore => write!(f, "ignore"),
            PredicateOption::Require => write!(f, "require"),
            PredicateOption::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for PredicateOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(PredicateOption::Ignore),
            "require" => Ok(PredicateOption::Require),
            "reject" => Ok(PredicateOption::Reject),
            other => Err(format!(
                "expected one of ignore, require, reject; got \"{other}\""
            )),
        }
    }
}

/// Accept/reject policy applied to every panorama a search finds.
///
/// The default ignores everything except unofficial coverage, which is
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationOptions {
    /// Backpack, boat and institutional imagery.
    pub trekker: PredicateOption,
    /// Official first-generation imagery.
    pub first_gen: PredicateOption,
    pub intersections: PredicateOption,
    /// Whether a building is nearby. Panoramas without place data fail
    /// both `Require` and `Reject`.
    pub buildings: PredicateOption,
    /// Third-party contributed imagery.
    pub unofficial: PredicateOption,
    /// Panoramas with exactly one neighbouring link.
    pub terminus: PredicateOption,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            trekker: PredicateOption::Ignore,
            first_gen: PredicateOption::Ignore,
            intersections: PredicateOption::Ignore,
            buildings: PredicateOption::Ignore,
            unofficial: PredicateOption::Reject,
            terminus: PredicateOption::Ignore,
        }
    }
}

impl LocationOptions {
    /// Options that accept every panorama the lookup returns.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            unofficial: PredicateOption::Ignore,
            ..Self::default()
        }
    }

    /// Whether the unofficial coverage tier may be searched at all.
    #[must_use]
    pub fn allows_unofficial(&self) -> bool {
        self.unofficial != PredicateOption::Reject
    }
}
