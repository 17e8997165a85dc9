use crate::utils::error::AppError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Upload size limit: 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

pub fn upload_root() -> PathBuf {
    PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()))
}

/// Lowercased extension of a file name, without the dot.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Server-side extension check: only `.xlsx` / `.xls` are accepted.
pub fn has_spreadsheet_extension(file_name: &str) -> bool {
    match extension_of(file_name) {
        Some(ext) => ALLOWED_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// Boundary MIME filter. A declared content type must look like a spreadsheet
/// type; an absent or unspecific (`application/octet-stream`) declaration
/// bypasses this half of the check; the extension check always applies.
pub fn is_spreadsheet_mime(content_type: Option<&str>) -> bool {
    match content_type {
        None | Some("") | Some("application/octet-stream") => true,
        Some(mime) => {
            mime == "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                || mime == "application/vnd.ms-excel"
                || mime == "application/excel"
        }
    }
}

/// Stored name for an uploaded part: `<field>-<millis><original extension>`.
pub fn generate_stored_name(field_name: &str, original_name: &str) -> String {
    let ext = extension_of(original_name)
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    format!(
        "{}-{}{}",
        field_name,
        chrono::Utc::now().timestamp_millis(),
        ext
    )
}

/// Removes stored bytes. An already-absent path is treated as success so a
/// concurrent delete of the same file cannot fail the request.
pub fn discard_stored(path: &Path) -> Result<(), AppError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::Internal(format!(
            "Failed to remove stored file {}: {}",
            path.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_excel_extensions_case_insensitively() {
        assert!(has_spreadsheet_extension("report.xlsx"));
        assert!(has_spreadsheet_extension("legacy.XLS"));
        assert!(!has_spreadsheet_extension("notes.csv"));
        assert!(!has_spreadsheet_extension("noextension"));
    }

    #[test]
    fn mime_filter_accepts_spreadsheet_types_and_bypasses_missing() {
        assert!(is_spreadsheet_mime(Some(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        )));
        assert!(is_spreadsheet_mime(Some("application/vnd.ms-excel")));
        assert!(is_spreadsheet_mime(None));
        assert!(is_spreadsheet_mime(Some("application/octet-stream")));
        assert!(!is_spreadsheet_mime(Some("text/csv")));
        assert!(!is_spreadsheet_mime(Some("image/png")));
    }

    #[test]
    fn stored_name_keeps_field_and_extension() {
        let name = generate_stored_name("file", "Sales Q3.xlsx");
        assert!(name.starts_with("file-"));
        assert!(name.ends_with(".xlsx"));
    }

    #[test]
    fn discard_tolerates_absent_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never-written.xlsx");
        assert!(discard_stored(&path).is_ok());
    }
}
