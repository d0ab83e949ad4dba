use std::path::Path;

use anyhow::{Context, Result};
use relay_aggregator::{from_json, to_json_pretty, ArtifactFile, SerializedInstruction};

/// Write one run's artifacts to `path`, replacing whatever was there.
pub async fn write_artifacts(path: impl AsRef<Path>, artifacts: &[SerializedInstruction]) -> Result<()> {
    let json = to_json_pretty(artifacts)?;
    write(path.as_ref(), json).await
}

pub async fn write_artifact_file(path: impl AsRef<Path>, file: &ArtifactFile) -> Result<()> {
    let json = serde_json::to_string_pretty(file)?;
    write(path.as_ref(), json).await
}

pub async fn read_artifacts(path: impl AsRef<Path>) -> Result<ArtifactFile> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("trying to read {path:?}"))?;

    from_json(&content).with_context(|| format!("malformed artifacts in {path:?}"))
}

async fn write(path: &Path, json: String) -> Result<()> {
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("trying to write {path:?}"))?;

    log::info!("wrote {path:?}");
    Ok(())
}
