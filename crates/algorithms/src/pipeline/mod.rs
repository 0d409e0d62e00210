//! Ordered filter pipelines
//!
//! A [`Pipeline`] is an append-only list of [`FilterStage`]s. Execution runs
//! the stages in append order, each consuming the previous output, and stops
//! at the first failure.

mod stage;

pub use stage::{FilterStage, OPERATIONS};

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diffusion::StopToken;
use voxkit_core::{Error, Result, VoxelGrid};

/// Sequence of filter stages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    stages: Vec<FilterStage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline pre-populated with `stages`
    pub fn from_stages(stages: Vec<FilterStage>) -> Self {
        Self { stages }
    }

    /// Append a stage
    pub fn append(&mut self, stage: FilterStage) -> &mut Self {
        self.stages.push(stage);
        self
    }

    /// Builder-style append
    pub fn then(mut self, stage: FilterStage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append a stage by vocabulary name, e.g. `append_named("GD", &[1.0])`
    pub fn append_named(&mut self, name: &str, params: &[f64]) -> Result<&mut Self> {
        let stage = FilterStage::from_name(name, params)?;
        Ok(self.append(stage))
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Parse a textual script.
    ///
    /// One stage per line or `;`-separated, written as the operation name
    /// followed by whitespace-separated numeric parameters. Text after `#`
    /// is ignored.
    ///
    /// ```text
    /// GD 1; GE 1
    /// PeronaMalik 5 2.0   # smooth
    /// ```
    pub fn parse(script: &str) -> Result<Self> {
        let mut pipeline = Pipeline::new();
        for line in script.lines() {
            let line = line.split('#').next().unwrap_or("");
            for command in line.split(';') {
                let mut tokens = command.split_whitespace();
                let Some(name) = tokens.next() else {
                    continue;
                };
                let params = tokens
                    .map(|t| {
                        t.parse::<f64>().map_err(|_| Error::InvalidParameter {
                            name: "params",
                            value: t.to_string(),
                            reason: format!("{} parameters must be numbers", name),
                        })
                    })
                    .collect::<Result<Vec<f64>>>()?;
                pipeline.append_named(name, &params)?;
            }
        }
        Ok(pipeline)
    }

    /// Load from JSON, `{"stages": [{"op": "GD", "radius": 1}, ...]}`.
    ///
    /// Every stage is validated after decoding.
    pub fn from_json(json: &str) -> Result<Self> {
        let pipeline: Pipeline =
            serde_json::from_str(json).map_err(|e| Error::InvalidInput(format!("pipeline JSON: {}", e)))?;
        for stage in &pipeline.stages {
            stage.validate()?;
        }
        Ok(pipeline)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Other(e.to_string()))
    }

    /// Run every stage in order and return the final grid.
    ///
    /// The input is never modified. An empty pipeline returns a copy of it.
    pub fn execute(&self, input: &VoxelGrid) -> Result<VoxelGrid> {
        self.execute_with_stop(input, None)
    }

    /// Like [`Pipeline::execute`], with a stop token polled by iterative stages.
    ///
    /// A failing stage is reported as `Error::Stage` with its position.
    pub fn execute_with_stop(&self, input: &VoxelGrid, stop: Option<&StopToken>) -> Result<VoxelGrid> {
        let mut current = input.clone();
        for (index, stage) in self.stages.iter().enumerate() {
            if stop.is_some_and(StopToken::is_stopped) {
                return Err(Error::Stage {
                    index,
                    operation: stage.name(),
                    source: Box::new(Error::Cancelled { iteration: 0 }),
                });
            }

            let start = Instant::now();
            current = stage
                .apply_with_stop(&current, stop)
                .map_err(|source| Error::Stage {
                    index,
                    operation: stage.name(),
                    source: Box::new(source),
                })?;
            debug!(
                index,
                operation = stage.name(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                extents = ?current.extents(),
                "stage complete"
            );
        }
        Ok(current)
    }
}

impl FromIterator<FilterStage> for Pipeline {
    fn from_iter<I: IntoIterator<Item = FilterStage>>(iter: I) -> Self {
        Self::from_stages(iter.into_iter().collect())
    }
}
