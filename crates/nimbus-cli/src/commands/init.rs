use anyhow::Result;
use std::path::Path;

use nimbus_core::config::NimbusConfig;

pub fn run(base_dir: &Path) -> Result<()> {
    println!("Initializing Nimbus in {}", base_dir.display());

    std::fs::create_dir_all(base_dir)?;

    let config_path = NimbusConfig::default_path(base_dir);
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
    } else {
        let config = NimbusConfig::default_config(base_dir);
        config.save(&config_path)?;
        println!("Created config: {}", config_path.display());
    }

    println!("\nNimbus initialized. Next steps:");
    println!("  1. Point [storage] in {} at your bucket", config_path.display());
    println!("  2. Run `nimbus put <key> <file>` to upload an object");

    Ok(())
}
