//! Model configuration loaded from YAML or JSON.
//!
//! Every field has a default, so an empty document is a valid configuration.

use std::path::Path;

use af_core::Dialect;
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    /// Log every block update at debug level.
    pub verbose: bool,
    pub codegen: CodegenConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "model".to_string(),
            verbose: false,
            codegen: CodegenConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CodegenConfig {
    pub dialect: Dialect,
    /// Also emit breakpoint and table arrays.
    pub emit_table_data: bool,
    /// Leading spaces on each C statement. Fortran always starts in column 7.
    pub indent: usize,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::C,
            emit_table_data: true,
            indent: 4,
        }
    }
}

pub fn from_yaml_str(content: &str) -> ModelResult<ModelConfig> {
    Ok(serde_yaml::from_str(content)?)
}

pub fn from_json_str(content: &str) -> ModelResult<ModelConfig> {
    Ok(serde_json::from_str(content)?)
}

pub fn load_yaml(path: &Path) -> ModelResult<ModelConfig> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn load_json(path: &Path) -> ModelResult<ModelConfig> {
    let content = std::fs::read_to_string(path)?;
    from_json_str(&content)
}

pub fn save_yaml(path: &Path, config: &ModelConfig) -> ModelResult<()> {
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
