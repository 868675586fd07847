use anyhow::{Context, Result};
use futures::TryStreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

pub async fn run(base_dir: &Path, key: &str, output: Option<&Path>) -> Result<()> {
    let storage = super::open_storage(base_dir).await?;

    if let Some(output) = output {
        let data = storage.load_once(key).await?;
        tokio::fs::write(output, &data)
            .await
            .with_context(|| format!("cannot write {}", output.display()))?;
        eprintln!("Wrote {} bytes to {}", data.len(), output.display());
        return Ok(());
    }

    let mut stream = storage.load_stream(key);
    let mut stdout = tokio::io::stdout();
    while let Some(chunk) = stream.try_next().await? {
        stdout.write_all(&chunk).await?;
    }
    stdout.flush().await?;
    Ok(())
}
