//! Export command implementation.

use anyhow::{bail, Context, Result};
use firehaul::export::{run_export, ConsoleProgress, ExportProgress};
use firehaul::sink::LocalSink;
use firehaul::{ExportConfig, ExportMode};
use std::path::PathBuf;

pub async fn run(
    project: String,
    output: PathBuf,
    mode: ExportMode,
    access_token: Option<String>,
    emulator_host: Option<String>,
    no_progress: bool,
) -> Result<()> {
    println!("Exporting project '{}' in {} mode", project, mode);

    let store = super::connect(&project, access_token, emulator_host)?;
    tracing::info!(%project, %mode, out = %output.display(), "starting export run");
    let config = ExportConfig::new(mode, output).with_project_id(project);

    let progress = if no_progress {
        None
    } else {
        Some(ConsoleProgress::new("Export:"))
    };
    let progress_ref: Option<&dyn ExportProgress> =
        progress.as_ref().map(|p| p as &dyn ExportProgress);

    let report = run_export(&store, &LocalSink, &config, progress_ref)
        .await
        .context("export run failed")?;

    println!();
    println!(
        "Exported {} documents across {} collections",
        report.documents(),
        report.collections.len()
    );
    for failure in &report.failures {
        eprintln!("  failed: {} ({})", failure.collection, failure.error);
    }

    if !report.success() {
        bail!(
            "{} collection subtree(s) failed; metadata.json withheld",
            report.failures.len()
        );
    }

    println!("Output: {}", config.resolved_output().display());
    Ok(())
}
