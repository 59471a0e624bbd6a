//! Plain-text export of reports and records

use crate::{MediZenError, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::info;

/// Strip Markdown emphasis and heading markers from model output
pub fn clean_report_text(text: &str) -> String {
    let mut cleaned = text.to_string();
    for marker in ["**", "###", "##", "#", "__", "`"] {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned.trim().to_string()
}

/// File name such as `MediZen_Clinical_Report_1718000000000.txt`
pub fn export_file_name(kind: &str) -> String {
    format!("MediZen_{}_{}.txt", kind, Utc::now().timestamp_millis())
}

/// Write `text` into `dir/filename`, creating the directory if needed
pub fn download_as_file(dir: &Path, filename: &str, text: &str) -> Result<PathBuf> {
    if filename.is_empty() || filename.contains(['/', '\\']) {
        return Err(MediZenError::InvalidInput(format!(
            "bad export file name {:?}",
            filename
        )));
    }

    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    std::fs::write(&path, text)?;

    info!("Exported {} bytes to {:?}", text.len(), path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_report_text() {
        let raw = "  ## Assessment\n**Hypertension** stage `1`\n### Plan\n__Rest__  ";
        assert_eq!(
            clean_report_text(raw),
            "Assessment\nHypertension stage 1\n Plan\nRest"
        );
    }

    #[test]
    fn test_export_file_name() {
        let name = export_file_name("Wellness_Report");
        assert!(name.starts_with("MediZen_Wellness_Report_"));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn test_download_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = download_as_file(&dir.path().join("out"), "record.txt", "hello").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }

    #[test]
    fn test_path_separators_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(download_as_file(dir.path(), "../escape.txt", "x").is_err());
    }
}
