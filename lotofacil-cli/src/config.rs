use std::path::Path;

use anyhow::{Context, Result};

use lotofacil_engine::EngineConfig;

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config {:?}", path))?;
    let config: EngineConfig = serde_json::from_str(&json)
        .with_context(|| format!("invalid config {:?}", path))?;
    Ok(config)
}

pub fn save_config(config: &EngineConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)
        .with_context(|| format!("cannot write config {:?}", path))?;
    Ok(())
}
