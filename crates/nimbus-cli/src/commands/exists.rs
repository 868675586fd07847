use anyhow::Result;
use std::path::Path;

pub async fn run(base_dir: &Path, key: &str) -> Result<bool> {
    let storage = super::open_storage(base_dir).await?;
    let found = storage.exists(key).await?;
    println!("{found}");
    Ok(found)
}
