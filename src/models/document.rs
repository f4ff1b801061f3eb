// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Medical document metadata and attached medicines.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Document category. Stored in the database as the display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Prescription,
    #[serde(rename = "Lab Report")]
    LabReport,
    #[serde(rename = "X-Ray")]
    XRay,
    Other,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Prescription => "Prescription",
            DocumentType::LabReport => "Lab Report",
            DocumentType::XRay => "X-Ray",
            DocumentType::Other => "Other",
        }
    }

    /// Path segment used inside storage locators: lowercased, spaces
    /// replaced with underscores ("Lab Report" -> "lab_report").
    pub fn slug(self) -> &'static str {
        match self {
            DocumentType::Prescription => "prescription",
            DocumentType::LabReport => "lab_report",
            DocumentType::XRay => "x-ray",
            DocumentType::Other => "other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata record referencing an opaque storage locator.
///
/// Always scoped to an owner and a family edge; `family_member_id` 0 is the
/// synthetic self edge. Deleting the record leaves the storage object in
/// place.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DocumentRecord {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub family_member_id: i64,
    pub document_name: String,
    pub document_type: String,
    pub document_date: NaiveDate,
    pub description: Option<String>,
    /// Opaque locator, `s3://{bucket}/{key}`
    #[serde(skip)]
    pub file_path: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Medicine line item extracted from a document.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Medicine {
    pub id: i64,
    #[serde(skip)]
    pub document_id: i64,
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_slug() {
        assert_eq!(DocumentType::Prescription.slug(), "prescription");
        assert_eq!(DocumentType::LabReport.slug(), "lab_report");
        assert_eq!(DocumentType::XRay.slug(), "x-ray");
        assert_eq!(DocumentType::Other.slug(), "other");
    }

    #[test]
    fn test_document_type_serde_names() {
        assert_eq!(
            serde_json::to_string(&DocumentType::LabReport).unwrap(),
            "\"Lab Report\""
        );
        let parsed: DocumentType = serde_json::from_str("\"X-Ray\"").unwrap();
        assert_eq!(parsed, DocumentType::XRay);
    }
}
