//! Downloadable JSON documents for runs and incidents.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::model::{IncidentDetail, RunDetail};

/// A rendered export: suggested file name, content hash and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub file_name: String,
    /// Hex SHA-256 of the compact JSON form of the record.
    pub etag: String,
    /// Pretty-printed JSON, two-space indent.
    pub content: String,
}

pub fn export_run(run: &RunDetail) -> Result<ExportDocument, serde_json::Error> {
    export(&run.id, run)
}

pub fn export_incident(incident: &IncidentDetail) -> Result<ExportDocument, serde_json::Error> {
    export(&incident.id, incident)
}

fn export<T: Serialize>(id: &str, record: &T) -> Result<ExportDocument, serde_json::Error> {
    let value = serde_json::to_value(record)?;
    Ok(ExportDocument {
        file_name: format!("{id}-export.json"),
        etag: compute_etag(&value)?,
        content: serde_json::to_string_pretty(&value)?,
    })
}

/// SHA-256 of the compact JSON representation.
pub fn compute_etag(value: &Value) -> Result<String, serde_json::Error> {
    let compact = serde_json::to_string(value)?;
    Ok(format!("{:x}", Sha256::digest(compact.as_bytes())))
}
