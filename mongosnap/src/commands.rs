use anyhow::{Context, Result};
use mongosnap_core::{DocumentStore, RestoreSummary, SnapshotManager, SnapshotSummary};
use std::io::{self, Write};

pub async fn execute_create<S: DocumentStore>(manager: &SnapshotManager<S>) -> Result<()> {
    let summary = manager
        .create_snapshot()
        .await
        .context("Failed to create snapshot")?;

    write_created(&mut io::stdout().lock(), &summary)?;
    Ok(())
}

pub async fn execute_restore<S: DocumentStore>(
    manager: &SnapshotManager<S>,
    snapshot: &str,
) -> Result<()> {
    let summary = manager
        .restore_snapshot(snapshot)
        .await
        .with_context(|| format!("Failed to restore snapshot {}", snapshot))?;

    write_restored(&mut io::stdout().lock(), &summary)?;
    Ok(())
}

pub async fn execute_list<S: DocumentStore>(manager: &SnapshotManager<S>) -> Result<()> {
    let snapshots = manager
        .list_snapshots()
        .await
        .context("Failed to list snapshots")?;

    write_snapshot_list(&mut io::stdout().lock(), &snapshots)?;
    Ok(())
}

fn write_created(out: &mut impl Write, summary: &SnapshotSummary) -> io::Result<()> {
    writeln!(out, "✓ Snapshot created successfully")?;
    writeln!(out, "  Name: {}", summary.name)?;
    writeln!(out, "  Path: {}", summary.path.display())?;
    writeln!(
        out,
        "  Exported: {} databases, {} collections, {} documents",
        summary.databases, summary.collections, summary.documents
    )
}

fn write_restored(out: &mut impl Write, summary: &RestoreSummary) -> io::Result<()> {
    writeln!(out, "✓ Snapshot {} restored successfully", summary.name)?;
    writeln!(
        out,
        "  Restored: {} databases, {} collections, {} documents",
        summary.databases, summary.collections, summary.documents
    )?;
    if summary.skipped_lines > 0 {
        writeln!(out, "  Skipped {} unparseable lines", summary.skipped_lines)?;
    }
    Ok(())
}

fn write_snapshot_list(out: &mut impl Write, snapshots: &[String]) -> io::Result<()> {
    if snapshots.is_empty() {
        return writeln!(out, "No snapshots found");
    }

    writeln!(out, "\nAvailable snapshots:")?;
    for snapshot in snapshots {
        writeln!(out, "- {}", snapshot)?;
    }
    Ok(())
}
