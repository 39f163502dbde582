//! Handlers for the qsa, monitor and weight commands

use anyhow::{Context, Result};
use colored::*;
use std::path::Path;
use std::time::Instant;

use crate::api::{BitableClient, DryRunSink, Operations};
use crate::cli::PipelineArgs;
use crate::config::Config;
use crate::pipeline::{
    NamedWorkbook, PipelineContext, WriteTargets, fetch_remote_workbooks, load_local_workbook, monitor,
    qsa, weight,
};
use crate::reference::ReferenceData;

/// Shown in dry-run output when a table variable is unset
const UNSET: &str = "<unset>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Qsa,
    Monitor,
    Weight,
}

impl PipelineKind {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineKind::Qsa => "QSA audit",
            PipelineKind::Monitor => "monitoring",
            PipelineKind::Weight => "unit weight",
        }
    }
}

fn write_targets(config: &Config) -> WriteTargets {
    WriteTargets {
        source_table_id: config.source_table_id.clone().unwrap_or_else(|| UNSET.to_string()),
        row_id: config.row_id.clone().unwrap_or_else(|| UNSET.to_string()),
        qsa_table_id: config.qsa_table_id.clone(),
        target_table_id: config.target_table_id.clone(),
    }
}

fn plan(kind: PipelineKind, workbooks: &[NamedWorkbook], ctx: &PipelineContext, targets: &WriteTargets) -> Operations {
    match kind {
        PipelineKind::Qsa => qsa::plan(workbooks, ctx, targets),
        PipelineKind::Monitor => monitor::plan(workbooks, ctx, targets),
        PipelineKind::Weight => weight::plan(
            workbooks,
            ctx,
            targets.target_table_id.as_deref().unwrap_or(UNSET),
        ),
    }
}

/// Run one pipeline.
///
/// With `--file` and `--dry-run` together nothing remote is touched and no
/// credentials are needed. Otherwise the remote variables are validated
/// first and the client authenticates before any work starts.
pub async fn handle_pipeline_command(kind: PipelineKind, args: PipelineArgs, reference: Option<&Path>) -> Result<()> {
    let started = Instant::now();
    let config = Config::from_env()?;
    let reference = ReferenceData::load(reference)?;
    let ctx = PipelineContext::new(reference, config.normalizer()?);

    println!("{} {} pipeline", "Running".bold(), kind.label().cyan());

    let offline = args.dry_run && args.file.is_some();
    let client = if offline {
        None
    } else {
        let remote = config.require_remote()?;
        if kind == PipelineKind::Weight && !args.dry_run {
            config.require_target_table()?;
        }
        let client = BitableClient::new(config.client_config(), remote.credentials.clone(), &remote.app_token)?;
        client
            .authenticate()
            .await
            .context("Failed to obtain tenant access token")?;
        Some((client, remote))
    };

    let workbooks = match (&args.file, &client) {
        (Some(path), _) => vec![load_local_workbook(path)?],
        (None, Some((client, remote))) => fetch_remote_workbooks(client, remote).await?,
        (None, None) => anyhow::bail!("No workbook source: pass --file or configure the remote row"),
    };

    let targets = write_targets(&config);
    let operations = plan(kind, &workbooks, &ctx, &targets);
    for operation in operations.operations() {
        log::debug!("Planned: {}", operation);
    }
    println!(
        "Planned {} writes ({} updates) from {} workbook(s)",
        operations.len().to_string().bold(),
        operations.update_count(),
        workbooks.len()
    );

    if operations.is_empty() {
        println!("{}", "Nothing to write".yellow());
        return Ok(());
    }

    let summary = match (&client, args.dry_run) {
        (Some((client, _)), false) => operations.execute(client).await?,
        _ => {
            println!("{}", "Dry run, nothing is sent".yellow());
            operations.execute(&DryRunSink::new()).await?
        }
    };

    println!();
    println!(
        "{} {} created, {} updated, {} failed ({:.1}s)",
        if summary.failed == 0 { "Done:".green().bold() } else { "Done with errors:".red().bold() },
        summary.created,
        summary.updated,
        summary.failed,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
