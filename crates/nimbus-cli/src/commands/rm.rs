use anyhow::Result;
use std::path::Path;

pub async fn run(base_dir: &Path, key: &str) -> Result<()> {
    let storage = super::open_storage(base_dir).await?;
    storage.delete(key).await?;
    println!("Deleted {key}");
    Ok(())
}
