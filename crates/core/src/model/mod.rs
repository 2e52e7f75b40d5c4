pub mod build;
pub mod custom;
pub mod point;
pub mod report;
pub mod target;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BuildPulseError, Result};
use crate::model::build::BuildContext;
use crate::model::custom::CustomData;

/// Everything the host hands over for one publish run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunInput {
    pub build: BuildContext,
    #[serde(flatten)]
    pub custom: CustomData,
}

impl RunInput {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| BuildPulseError::Io(format!("failed reading {}: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| {
            BuildPulseError::InvalidArgument(format!("failed parsing {}: {e}", path.display()))
        })
    }
}
