//! Locating Excel attachments on a bitable row

use anyhow::{Result, bail};

use super::client::BitableClient;
use super::models::Attachment;
use crate::workbook::is_excel_file_name;

/// An Excel attachment with a URL it can be downloaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcelAttachment {
    pub name: String,
    pub url: String,
}

/// Attachments whose name carries an Excel extension, in field order
pub fn excel_attachments(attachments: &[Attachment]) -> Vec<&Attachment> {
    attachments
        .iter()
        .filter(|a| is_excel_file_name(&a.name))
        .collect()
}

/// Direct URL of an attachment, if the field value carries one
fn direct_url(attachment: &Attachment) -> Option<&str> {
    [attachment.url.as_deref(), attachment.tmp_url.as_deref()]
        .into_iter()
        .flatten()
        .find(|u| !u.is_empty())
}

/// Find the Excel attachments of `record_id` in `field`.
///
/// Attachments without a direct URL are resolved through their file token.
/// An empty record id, a missing row, an empty field or a field without any
/// Excel file are all errors.
pub async fn locate_excel_attachments(
    client: &BitableClient,
    table_id: &str,
    record_id: &str,
    field: &str,
) -> Result<Vec<ExcelAttachment>> {
    if record_id.trim().is_empty() {
        bail!("Record id is empty");
    }

    let Some(record) = client.find_record(table_id, record_id).await? else {
        bail!("Record {} not found in table {}", record_id, table_id);
    };

    let attachments = record.attachments(field);
    if attachments.is_empty() {
        bail!("Record {} has no attachments in field '{}'", record_id, field);
    }

    let excel = excel_attachments(&attachments);
    if excel.is_empty() {
        bail!(
            "Record {} has no Excel attachment in field '{}' ({} other files)",
            record_id,
            field,
            attachments.len()
        );
    }

    let missing_tokens: Vec<String> = excel
        .iter()
        .filter(|a| direct_url(a).is_none())
        .filter_map(|a| a.file_token.clone())
        .collect();
    let tmp_urls = client.tmp_download_urls(&missing_tokens).await?;

    let mut located = Vec::with_capacity(excel.len());
    for attachment in excel {
        let url = match direct_url(attachment) {
            Some(url) => Some(url.to_string()),
            None => attachment
                .file_token
                .as_ref()
                .and_then(|t| tmp_urls.get(t).cloned()),
        };
        match url {
            Some(url) => {
                log::info!("Found attachment {}", attachment.name);
                located.push(ExcelAttachment {
                    name: attachment.name.clone(),
                    url,
                });
            }
            None => log::warn!("Attachment {} has no download URL, skipped", attachment.name),
        }
    }

    if located.is_empty() {
        bail!("No Excel attachment of record {} could be downloaded", record_id);
    }
    Ok(located)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(name: &str, url: Option<&str>) -> Attachment {
        Attachment {
            file_token: Some(format!("tok-{}", name)),
            name: name.to_string(),
            url: url.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_excel_attachments_filters_by_extension() {
        let attachments = vec![
            attachment("照片.jpg", Some("u1")),
            attachment("报告.XLSX", Some("u2")),
            attachment("旧版.xls", None),
            attachment("说明.pdf", Some("u3")),
        ];
        let names: Vec<&str> = excel_attachments(&attachments)
            .into_iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["报告.XLSX", "旧版.xls"]);
    }

    #[test]
    fn test_direct_url_prefers_url_then_tmp_url() {
        let mut a = attachment("a.xlsx", None);
        assert_eq!(direct_url(&a), None);
        a.tmp_url = Some("tmp".to_string());
        assert_eq!(direct_url(&a), Some("tmp"));
        a.url = Some("direct".to_string());
        assert_eq!(direct_url(&a), Some("direct"));
        a.url = Some(String::new());
        assert_eq!(direct_url(&a), Some("tmp"));
    }
}
