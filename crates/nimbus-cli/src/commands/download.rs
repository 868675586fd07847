use anyhow::Result;
use std::path::Path;

pub async fn run(base_dir: &Path, key: &str, dest: &Path) -> Result<()> {
    let storage = super::open_storage(base_dir).await?;
    storage.download(key, dest).await?;
    println!("Downloaded {key} -> {}", dest.display());
    Ok(())
}
