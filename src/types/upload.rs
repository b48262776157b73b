use serde::{Deserialize, Serialize};

/// A file to be ingested into a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Name reported to the service.
    pub filename: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Creates a new upload.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// What the service reports after ingesting an upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Name of the ingested file. Untrusted; escape before display.
    pub filename: String,
    /// Number of fragments the file was split into.
    pub chunks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_ignores_status_field() {
        let receipt: UploadReceipt =
            serde_json::from_str(r#"{"status":"ok","filename":"notes.txt","chunks":12}"#)
                .unwrap();
        assert_eq!(
            receipt,
            UploadReceipt {
                filename: "notes.txt".to_string(),
                chunks: 12
            }
        );
    }
}
