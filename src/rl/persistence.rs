//! Saving and loading trained agents
//!
//! The value table is written as JSON to the given path, and the metadata
//! needed to rebuild the agent goes next to it as `<path>.meta.json`.

use super::{Agent, AgentConfig, ValueTable};
use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata saved with the value table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadata {
    /// Configuration the agent was trained with
    pub config: AgentConfig,

    pub n_states: usize,

    pub n_actions: usize,

    /// Transitions the agent has learned from
    pub steps_trained: usize,

    /// Training episodes completed
    pub episodes_trained: usize,

    /// Crate version that wrote the files
    pub version: String,
}

impl AgentMetadata {
    pub fn from_agent(agent: &Agent) -> Self {
        let table = agent.value_table();
        Self {
            config: agent.config().clone(),
            n_states: table.n_states(),
            n_actions: table.n_actions(),
            steps_trained: agent.steps_trained(),
            episodes_trained: agent.episodes_trained(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// `<path>.meta.json`, keeping any extension `path` already has
fn metadata_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".meta.json");
    PathBuf::from(name)
}

fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> crate::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    std::fs::write(path, json)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> crate::Result<T> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Save an agent's value table and metadata
///
/// Creates parent directories if they don't exist.
pub fn save_agent(agent: &Agent, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }

    write_json(path, agent.value_table(), false)
        .with_context(|| format!("Failed to write value table to {:?}", path))?;

    let meta_path = metadata_path(path);
    write_json(&meta_path, &AgentMetadata::from_agent(agent), true)
        .with_context(|| format!("Failed to write metadata to {:?}", meta_path))?;

    Ok(())
}

/// Load a saved value table together with its metadata
pub fn load_value_table(path: &Path) -> Result<(ValueTable, AgentMetadata)> {
    let meta_path = metadata_path(path);
    let metadata: AgentMetadata = read_json(&meta_path)
        .with_context(|| format!("Failed to read metadata from {:?}", meta_path))?;
    let table: ValueTable = read_json(path)
        .with_context(|| format!("Failed to read value table from {:?}", path))?;

    if table.n_states() != metadata.n_states || table.n_actions() != metadata.n_actions {
        bail!(
            "Value table in {:?} does not match its metadata ({}x{})",
            path,
            metadata.n_states,
            metadata.n_actions
        );
    }

    Ok((table, metadata))
}

/// Rebuild a trained agent from disk, including its training counters
pub fn load_agent(path: &Path) -> Result<Agent> {
    let (table, metadata) = load_value_table(path)?;
    let mut agent = Agent::from_parts(metadata.config, table)
        .with_context(|| format!("Invalid agent configuration in {:?}", path))?;
    agent.set_progress(metadata.steps_trained, metadata.episodes_trained);
    Ok(agent)
}
