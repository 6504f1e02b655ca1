use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::alloc::NumberingScheme;
use crate::error::OptionsError;
use crate::sort::SortOrder;

/// Annotation settings, usually read from an `annotate.toml`:
///
/// ```toml
/// numbering = "per-sheet"
/// sheet_interval = 100
/// order = "y-position"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotateOptions {
    pub numbering: NumberingScheme,
    /// Size of each sheet's number block under [`NumberingScheme::PerSheet`].
    pub sheet_interval: u32,
    /// First number under [`NumberingScheme::Sequential`].
    pub start_number: u32,
    /// Order in which unannotated references are visited.
    pub order: SortOrder,
    /// Drop existing numbers and annotate everything again.
    pub reset: bool,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            numbering: NumberingScheme::Sequential,
            sheet_interval: 100,
            start_number: 1,
            order: SortOrder::XPosition,
            reset: false,
        }
    }
}

impl AnnotateOptions {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, OptionsError> {
        let content = fs::read_to_string(path)?;
        content.parse()
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.numbering == NumberingScheme::PerSheet && self.sheet_interval == 0 {
            return Err(OptionsError::Invalid(
                "sheet_interval must be positive for per-sheet numbering".to_owned(),
            ));
        }
        if self.order == SortOrder::TimeStamp {
            log::warn!("annotating in time-stamp order ignores placement");
        }
        Ok(())
    }
}

impl std::str::FromStr for AnnotateOptions {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let options: AnnotateOptions = toml::from_str(s)?;
        options.validate()?;
        Ok(options)
    }
}
