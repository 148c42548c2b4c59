use serde::Serialize;

/// Figures attached to every artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessMetrics {
    pub file_count: usize,
    pub input_size_bytes: u64,
    pub output_size_bytes: u64,
    pub page_count: u32,
}

/// Coarse pipeline status, without the payload of the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Idle,
    Validating,
    Processing,
    Succeeded,
    Failed,
}

/// A staged file as shown in the file list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub size_bytes: u64,
    pub size_label: String,
    pub mime_type: String,
}

/// The finished artifact, minus its bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSummary {
    pub filename: String,
    pub mime_type: &'static str,
    pub metrics: ProcessMetrics,
}

/// Everything a front end needs to render one pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub tool: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub accept: &'static str,
    pub allows_multiple: bool,
    pub status: Status,
    /// Message of a failed run
    pub error: Option<String>,
    /// Message of a rejected selection
    pub validation_error: Option<String>,
    pub files: Vec<FileEntry>,
    pub total_size_label: String,
    pub can_process: bool,
    pub process_label: String,
    pub upload_title: &'static str,
    pub rotation_degrees: i32,
    pub success_message: Option<String>,
    pub artifact: Option<ArtifactSummary>,
}

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count for display: "0 Bytes", "1.5 KB", "12.34 MB".
///
/// Values are rounded to two decimals with trailing zeros dropped. Anything
/// past the gigabyte range stays in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(1), "1 Bytes");
        assert_eq!(format_file_size(500), "500 Bytes");
        assert_eq!(format_file_size(1023), "1023 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024 * 1024), "1 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 + 1024 * 1024 / 4), "5.25 MB");
        assert_eq!(format_file_size(1024 * 1024 * 1024), "1 GB");
        assert_eq!(format_file_size(2048 * 1024 * 1024 * 1024), "2048 GB");
    }

    #[test]
    fn test_format_file_size_rounds_to_two_decimals() {
        // 1234 / 1024 = 1.205078...
        assert_eq!(format_file_size(1234), "1.21 KB");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&Status::Succeeded).unwrap();
        assert_eq!(json, "\"succeeded\"");
    }

    #[test]
    fn test_metrics_serialize() {
        let metrics = ProcessMetrics {
            file_count: 2,
            input_size_bytes: 2048,
            output_size_bytes: 1024,
            page_count: 5,
        };
        let value = serde_json::to_value(&metrics).unwrap();
        assert_eq!(value["file_count"], 2);
        assert_eq!(value["page_count"], 5);
    }
}
