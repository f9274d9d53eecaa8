//! JSON export of the fused grid.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{ensure, Context, Result};
use log::info;
use tsdf_fusion::GridSnapshot;

/// Write `snapshot` to `path` as JSON.
pub fn write_snapshot(path: &Path, snapshot: &GridSnapshot) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, snapshot)
        .with_context(|| format!("failed to serialize grid to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(
        "exported {}^3 grid ({} frames) to {}",
        snapshot.resolution,
        snapshot.frames_integrated,
        path.display()
    );
    Ok(())
}

/// Read a snapshot written by [`write_snapshot`], checking buffer sizes.
pub fn read_snapshot(path: &Path) -> Result<GridSnapshot> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let snapshot: GridSnapshot = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse grid {}", path.display()))?;

    let r = snapshot.resolution;
    let expected = r
        .checked_mul(r)
        .and_then(|r2| r2.checked_mul(r))
        .context("grid resolution overflows")?;
    ensure!(
        snapshot.tsdf.len() == expected && snapshot.weight.len() == expected,
        "grid {}: expected {expected} voxels, got tsdf={} weight={}",
        path.display(),
        snapshot.tsdf.len(),
        snapshot.weight.len()
    );
    Ok(snapshot)
}
