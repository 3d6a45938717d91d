//! `contentsplit config`: Configuration management commands.

use contentsplit_config::SplitterConfig;

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = SplitterConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", SplitterConfig::config_path().display());
    Ok(())
}

pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = SplitterConfig::config_path();
    if SplitterConfig::write_default(&config_path)? {
        println!("✅ Created config file: {}", config_path.display());
    } else {
        println!("  Config file exists: {}", config_path.display());
    }
    Ok(())
}
