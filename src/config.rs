//! JSON study description bundling the design space and every model input.
//!
//! ```json
//! {
//!   "space": {
//!     "geometries": [{ "kind": "helmholtz" }],
//!     "turns": [200, 400, 600],
//!     "currents": [20000.0, 40000.0, 80000.0],
//!     "radii": [0.2, 0.3, 0.5]
//!   },
//!   "pipeline": { "coverage_band": 0.01 }
//! }
//! ```
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoilResult;
use crate::oracle::{HoopStressOracle, StressOracle};
use crate::search::{search, Objective, ParameterSpace, Pipeline, SearchOutcome, Strategy};

/// A complete study. Only `space` and `pipeline.coverage_band` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    pub space: ParameterSpace,
    #[serde(default)]
    pub strategy: Strategy,
    pub pipeline: Pipeline,
    #[serde(default)]
    pub objective: Objective,
    /// Cross-check each assessed configuration with the lumped hoop-stress estimate
    #[serde(default)]
    pub hoop_stress: Option<HoopStressOracle>,
}

impl StudyConfig {
    pub fn new(space: ParameterSpace, pipeline: Pipeline) -> Self {
        Self {
            space,
            strategy: Strategy::default(),
            pipeline,
            objective: Objective::default(),
            hoop_stress: None,
        }
    }

    pub fn from_json_str(json: &str) -> CoilResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> CoilResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Run the sweep described by this study.
    pub fn run(&self) -> CoilResult<SearchOutcome> {
        let oracle = self.hoop_stress.as_ref().map(|o| o as &dyn StressOracle);
        search(&self.space, &self.strategy, &self.pipeline, oracle)
    }
}
