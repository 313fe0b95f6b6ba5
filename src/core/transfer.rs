//! Content export and import.
//!
//! An export is a JSON document with one array of entries per content type.
//! Imports are validated structurally before anything is written; the preview
//! reports, per type, how many entries are new and how many already exist.
//! Existing entries are then skipped or overwritten as the admin chooses.

use crate::{
    core::audit::{self, AuditAction},
    core::cms::{CmsClient, ContentEntry, ContentQuery, ContentSink},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use tracing::{error, info, instrument, warn};

/// Format version written into exports.
pub const EXPORT_VERSION: u32 = 1;

/// Ids of entries already present, per content type.
pub type ExistingIds = BTreeMap<String, BTreeSet<String>>;

/// A full export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// When the export was made
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    /// Entries per content type
    pub content: BTreeMap<String, Vec<ContentEntry>>,
}

const fn default_version() -> u32 {
    EXPORT_VERSION
}

/// Fetches every selected content type into one export document.
///
/// # Errors
/// Fails on the first content type that cannot be fetched; a partial export
/// is never returned.
#[instrument(skip(client))]
pub async fn export_content(
    client: &CmsClient,
    types: &[String],
    limit: u32,
) -> Result<ExportDocument> {
    let mut content = BTreeMap::new();
    for content_type in types {
        let entries = client
            .fetch(content_type, &ContentQuery::new().limit(limit))
            .await
            .inspect_err(|e| error!("Export of {} failed: {}", content_type, e))?;
        info!("Exported {} {} entries", entries.len(), content_type);
        content.insert(content_type.clone(), entries);
    }
    Ok(ExportDocument {
        version: EXPORT_VERSION,
        exported_at: Some(Utc::now()),
        content,
    })
}

/// Writes an export document as pretty JSON.
pub fn write_export(document: &ExportDocument, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_vec_pretty(document)?)?;
    Ok(())
}

/// Ids currently in the CMS for each type, used to classify import entries.
pub async fn fetch_existing_ids(
    client: &CmsClient,
    types: &[String],
    limit: u32,
) -> Result<ExistingIds> {
    let mut existing = ExistingIds::new();
    for content_type in types {
        let entries = client
            .fetch(content_type, &ContentQuery::new().limit(limit))
            .await?;
        existing.insert(
            content_type.clone(),
            entries.into_iter().map(|e| e.id).collect(),
        );
    }
    Ok(existing)
}

/// One structural problem in an import file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// JSON path of the problem, e.g. `content.faq[2].id`
    pub path: String,
    /// What is wrong
    pub message: String,
}

impl ValidationIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// New vs already-present entries of one type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeCounts {
    /// Entries whose id is not in the CMS yet
    pub new: usize,
    /// Entries whose id already exists
    pub existing: usize,
}

/// A validated import, ready to apply.
#[derive(Debug, Clone)]
pub struct ImportPreview {
    /// The parsed document
    pub document: ExportDocument,
    /// Counts per content type
    pub counts: BTreeMap<String, TypeCounts>,
}

/// What to do with entries that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictResolution {
    /// Leave existing entries untouched
    Skip,
    /// Replace existing entries with the imported data
    Overwrite,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Entries created
    pub created: usize,
    /// Existing entries overwritten
    pub updated: usize,
    /// Existing entries skipped
    pub skipped: usize,
    /// `(type, id, error)` for every entry that failed
    pub failed: Vec<(String, String, String)>,
}

/// Validates raw import text and classifies its entries against `existing`.
///
/// # Errors
/// Returns every structural problem found; nothing is applied in that case.
pub fn validate_import(
    raw: &str,
    existing: &ExistingIds,
) -> std::result::Result<ImportPreview, Vec<ValidationIssue>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| vec![ValidationIssue::new("$", format!("not valid JSON: {e}"))])?;

    let issues = structural_issues(&value);
    if !issues.is_empty() {
        return Err(issues);
    }

    let document: ExportDocument = serde_json::from_value(value)
        .map_err(|e| vec![ValidationIssue::new("$", e.to_string())])?;

    let counts = document
        .content
        .iter()
        .map(|(content_type, entries)| {
            let known = existing.get(content_type);
            let existing_count = entries
                .iter()
                .filter(|e| known.is_some_and(|ids| ids.contains(&e.id)))
                .count();
            (
                content_type.clone(),
                TypeCounts {
                    new: entries.len() - existing_count,
                    existing: existing_count,
                },
            )
        })
        .collect();

    Ok(ImportPreview { document, counts })
}

fn structural_issues(value: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let Some(root) = value.as_object() else {
        return vec![ValidationIssue::new("$", "expected a JSON object")];
    };

    if let Some(version) = root.get("version") {
        match version.as_u64() {
            Some(v) if v >= 1 && v <= u64::from(EXPORT_VERSION) => {}
            _ => issues.push(ValidationIssue::new(
                "version",
                format!("unsupported version {version}"),
            )),
        }
    }

    let Some(content) = root.get("content") else {
        issues.push(ValidationIssue::new("content", "missing"));
        return issues;
    };
    let Some(content) = content.as_object() else {
        issues.push(ValidationIssue::new("content", "expected an object"));
        return issues;
    };

    for (content_type, entries) in content {
        let type_path = format!("content.{content_type}");
        let Some(entries) = entries.as_array() else {
            issues.push(ValidationIssue::new(type_path, "expected an array"));
            continue;
        };
        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            let entry_path = format!("{type_path}[{index}]");
            let Some(entry) = entry.as_object() else {
                issues.push(ValidationIssue::new(entry_path, "expected an object"));
                continue;
            };
            match entry.get("id").and_then(Value::as_str) {
                Some(id) if !id.trim().is_empty() => {
                    if !seen.insert(id) {
                        issues.push(ValidationIssue::new(
                            format!("{entry_path}.id"),
                            format!("duplicate id {id}"),
                        ));
                    }
                }
                _ => issues.push(ValidationIssue::new(
                    format!("{entry_path}.id"),
                    "must be a non-empty string",
                )),
            }
            if !entry.get("data").is_some_and(Value::is_object) {
                issues.push(ValidationIssue::new(
                    format!("{entry_path}.data"),
                    "must be an object",
                ));
            }
        }
    }
    issues
}

/// Writes a validated import through `sink`. Failures of single entries are
/// recorded in the report and do not stop the rest.
#[instrument(skip(preview, existing, sink))]
pub async fn apply_import<S: ContentSink>(
    preview: &ImportPreview,
    existing: &ExistingIds,
    resolution: ConflictResolution,
    publish: bool,
    sink: &S,
) -> ImportReport {
    let mut report = ImportReport::default();
    for (content_type, entries) in &preview.document.content {
        let known = existing.get(content_type);
        for entry in entries {
            let exists = known.is_some_and(|ids| ids.contains(&entry.id));
            let result = match (exists, resolution) {
                (true, ConflictResolution::Skip) => {
                    report.skipped += 1;
                    continue;
                }
                (true, ConflictResolution::Overwrite) => sink
                    .update(content_type, &entry.id, &entry.data, publish)
                    .await
                    .map(|()| report.updated += 1),
                (false, _) => sink
                    .create(content_type, &entry.data, publish)
                    .await
                    .map(|()| report.created += 1),
            };
            if let Err(e) = result {
                warn!("Import of {}/{} failed: {}", content_type, entry.id, e);
                report
                    .failed
                    .push((content_type.clone(), entry.id.clone(), e.to_string()));
            }
        }
    }
    info!(
        "Import finished: {} created, {} updated, {} skipped, {} failed",
        report.created,
        report.updated,
        report.skipped,
        report.failed.len()
    );
    report
}

/// Records an import in the audit log.
pub async fn record_import(
    db: &DatabaseConnection,
    actor: &str,
    preview: &ImportPreview,
    report: &ImportReport,
) -> Result<()> {
    let types: Vec<&str> = preview.counts.keys().map(String::as_str).collect();
    audit::record(
        db,
        actor,
        AuditAction::Import,
        "content",
        &types.join(","),
        Some(serde_json::to_string(report)?),
    )
    .await?;
    Ok(())
}
