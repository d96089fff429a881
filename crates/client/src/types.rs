//! Wire types for the housekeeping backend.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Error body returned by the backend. Routes use either key.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorResponse {
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
    }
}

/// Body of `POST /room/import-to-housekeeping`.
#[derive(Debug, Clone, Serialize)]
pub struct ImportRequest {
    pub date: String,
}

/// Acknowledgement carrying an optional human-readable message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// A generated room sheet hosted on the media CDN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSheet {
    pub public_id: String,
    pub secure_url: String,
}

impl RoomSheet {
    /// Short label: the last path segment of the public id without the
    /// `room_sheet_` prefix.
    pub fn label(&self) -> &str {
        let name = self
            .public_id
            .rsplit('/')
            .next()
            .unwrap_or(&self.public_id);
        name.strip_prefix("room_sheet_").unwrap_or(name)
    }
}

/// Bytes sent so far out of the total for a report upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.sent.min(self.total) * 100) / self.total) as u8
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";

/// A PMS occupancy report for one day.
#[derive(Debug, Clone)]
pub struct ReportUpload {
    pub report_date: NaiveDate,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ReportUpload {
    pub fn new(report_date: NaiveDate, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            report_date,
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.bytes.starts_with(PDF_MAGIC)
    }
}
