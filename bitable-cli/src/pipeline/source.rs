//! Where a pipeline's workbooks come from

use anyhow::{Context, Result};
use std::path::Path;

use crate::api::{BitableClient, locate_excel_attachments};
use crate::config::RemoteConfig;
use crate::workbook::{Workbook, read_workbook, read_workbook_file};

/// A parsed workbook with the file name it came from
#[derive(Debug, Clone)]
pub struct NamedWorkbook {
    pub name: String,
    pub workbook: Workbook,
}

/// Parse a workbook from disk
pub fn load_local_workbook(path: &Path) -> Result<NamedWorkbook> {
    let workbook = read_workbook_file(path)?;
    log::info!(
        "Loaded {} ({} sheets)",
        path.display(),
        workbook.len()
    );
    Ok(NamedWorkbook {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        workbook,
    })
}

/// Download and parse every Excel attachment of the triggering row
pub async fn fetch_remote_workbooks(client: &BitableClient, remote: &RemoteConfig) -> Result<Vec<NamedWorkbook>> {
    let attachments = locate_excel_attachments(
        client,
        &remote.source_table_id,
        &remote.row_id,
        &remote.attachment_field,
    )
    .await
    .context("Failed to locate attachments")?;

    let mut workbooks = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        log::info!("Downloading {}", attachment.name);
        let bytes = client
            .download(&attachment.url)
            .await
            .with_context(|| format!("Failed to download {}", attachment.name))?;
        let workbook = read_workbook(&bytes, &attachment.name)?;
        log::info!("Parsed {} ({} sheets)", attachment.name, workbook.len());
        workbooks.push(NamedWorkbook {
            name: attachment.name,
            workbook,
        });
    }
    Ok(workbooks)
}
