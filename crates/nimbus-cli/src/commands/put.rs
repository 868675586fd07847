use anyhow::{Context, Result};
use std::path::Path;

pub async fn run(base_dir: &Path, key: &str, file: &Path) -> Result<()> {
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("cannot read {}", file.display()))?;
    let storage = super::open_storage(base_dir).await?;

    storage.save(key, &data).await?;
    println!("Saved {key} ({} bytes)", data.len());
    Ok(())
}
