//! `agentloom config`: show or initialize configuration.

use std::path::Path;

use agentloom_config::AppConfig;

pub fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", config.to_toml());
    Ok(())
}

pub fn init(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path.map_or_else(AppConfig::config_path, Path::to_path_buf);
    write_default(&path)?;
    println!("✅ Wrote default config to {}", path.display());
    Ok(())
}

/// Write the default config to `path`, refusing to overwrite.
fn write_default(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        return Err(format!("{} already exists", path.display()).into());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(())
}
