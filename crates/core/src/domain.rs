//! Legal domains.
//!
//! Every question is routed to exactly one domain, and every domain owns its
//! own document index.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// A closed-set topical category a question is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Domain {
    /// Succession, wills and forced heirship
    Inheritance,
    /// Separation, divorce and its consequences
    Divorce,
}

impl Domain {
    /// All domains, in label order used by the routing prompt.
    pub const ALL: [Domain; 2] = [Domain::Inheritance, Domain::Divorce];

    /// Upper-case label used in prompts and model output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Inheritance => "INHERITANCE",
            Self::Divorce => "DIVORCE",
        }
    }

    /// Short human description used when listing labels to the classifier.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Inheritance => "questions related to inheritance law",
            Self::Divorce => "questions related to divorce law",
        }
    }

    /// Lower-case slug used for index directories.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Inheritance => "inheritance",
            Self::Divorce => "divorce",
        }
    }

    /// Match a label exactly (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Domain {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s.trim()).ok_or_else(|| {
            AppError::Config(format!(
                "Unknown domain: {}. Supported: {}",
                s,
                Self::ALL.map(|d| d.label()).join(", ")
            ))
        })
    }
}
