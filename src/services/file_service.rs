use crate::database::MongoDB;
use crate::models::File;
use crate::services::auth_service::{self, Claims};
use crate::utils::error::AppError;
use crate::utils::spreadsheet::{parse_sheet, ParsedSheet};
use crate::utils::storage;
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use std::fs;
use std::path::{Path, PathBuf};

/// One file part drained from a multipart body.
#[derive(Debug)]
pub struct UploadPart {
    pub field_name: String,
    pub original_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Stored bytes plus everything derived from them, before the File entity
/// is persisted.
#[derive(Debug)]
pub struct StagedUpload {
    pub file_name: String,
    pub file_path: PathBuf,
    pub size: i64,
    pub columns: Vec<String>,
}

/// Boundary filter, applied before anything touches disk: extension must be
/// `.xlsx`/`.xls` and a declared content type must look like a spreadsheet.
pub fn check_part(original_name: &str, content_type: Option<&str>) -> Result<(), AppError> {
    if !storage::has_spreadsheet_extension(original_name)
        || !storage::is_spreadsheet_mime(content_type)
    {
        return Err(AppError::UnsupportedFileType(
            "Please upload an Excel file (.xlsx or .xls)".to_string(),
        ));
    }
    Ok(())
}

/// Writes the uploaded bytes under `root`, re-checks the extension
/// server-side, parses the stored file, and derives the column list.
///
/// The extension check runs again here even though the boundary filter
/// already passed: the bytes are on disk at this point, and every failure
/// path must delete them before returning.
pub fn store_and_extract(root: &Path, part: &UploadPart) -> Result<StagedUpload, AppError> {
    fs::create_dir_all(root)?;

    let file_name = storage::generate_stored_name(&part.field_name, &part.original_name);
    let file_path = root.join(&file_name);
    fs::write(&file_path, &part.bytes)?;

    if !storage::has_spreadsheet_extension(&part.original_name) {
        storage::discard_stored(&file_path)?;
        return Err(AppError::UnsupportedFileType(
            "Please upload an Excel file (.xlsx or .xls)".to_string(),
        ));
    }

    let parsed = match parse_sheet(&file_path) {
        Ok(parsed) => parsed,
        Err(e) => {
            storage::discard_stored(&file_path)?;
            return Err(e);
        }
    };

    Ok(StagedUpload {
        file_name,
        file_path,
        size: part.bytes.len() as i64,
        columns: parsed.columns,
    })
}

/// Upload pipeline: stage the bytes, then persist the File entity owned by
/// the caller.
pub async fn save_upload(db: &MongoDB, claims: &Claims, part: UploadPart) -> Result<File, AppError> {
    let owner = caller_id(claims)?;
    let staged = store_and_extract(&storage::upload_root(), &part)?;

    let mut file = File {
        id: None,
        user: owner,
        original_name: part.original_name,
        file_name: staged.file_name,
        file_path: staged.file_path.to_string_lossy().into_owned(),
        file_type: part.content_type.unwrap_or_default(),
        size: staged.size,
        columns: staged.columns,
        created_at: Some(BsonDateTime::now()),
    };

    let collection = db.collection::<File>("files");
    let result = match collection.insert_one(&file).await {
        Ok(result) => result,
        Err(e) => {
            // the bytes are already durable; don't leave them orphaned
            storage::discard_stored(&staged.file_path)?;
            return Err(e.into());
        }
    };
    file.id = result.inserted_id.as_object_id();

    log::info!(
        "📄 File uploaded: {} ({} bytes, {} columns) for user {}",
        file.original_name,
        file.size,
        file.columns.len(),
        claims.sub
    );

    Ok(file)
}

/// Caller's files, newest first.
pub async fn list_files(db: &MongoDB, claims: &Claims) -> Result<Vec<File>, AppError> {
    let owner = caller_id(claims)?;
    let collection = db.collection::<File>("files");

    let mut cursor = collection
        .find(doc! { "user": owner })
        .sort(doc! { "createdAt": -1 })
        .await?;

    let mut files = Vec::new();
    while let Some(result) = cursor.next().await {
        files.push(result?);
    }
    Ok(files)
}

/// Retrieval pipeline: load, authorize, then re-parse the stored bytes from
/// disk. There is no cache; every read pays the full parse.
pub async fn get_file(
    db: &MongoDB,
    claims: &Claims,
    file_id: &str,
) -> Result<(File, ParsedSheet), AppError> {
    let file = find_file(db, file_id).await?;
    auth_service::assert_owner_or_admin(claims, &file.user, "access this file")?;

    let parsed = parse_sheet(Path::new(&file.file_path))?;
    Ok((file, parsed))
}

/// Deletes the File record and its backing bytes. A concurrently removed
/// backing file counts as success.
pub async fn delete_file(db: &MongoDB, claims: &Claims, file_id: &str) -> Result<(), AppError> {
    let file = find_file(db, file_id).await?;
    auth_service::assert_owner_or_admin(claims, &file.user, "delete this file")?;

    storage::discard_stored(Path::new(&file.file_path))?;

    let collection = db.collection::<File>("files");
    collection.delete_one(doc! { "_id": file.id }).await?;

    log::info!("🗑️ File deleted: {} by user {}", file_id, claims.sub);
    Ok(())
}

pub async fn find_file(db: &MongoDB, file_id: &str) -> Result<File, AppError> {
    let object_id = ObjectId::parse_str(file_id)
        .map_err(|_| AppError::Validation("Invalid file ID".to_string()))?;

    let collection = db.collection::<File>("files");
    collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))
}

fn caller_id(claims: &Claims) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthenticated("Invalid token subject".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn xlsx_bytes(rows: &[Vec<&str>]) -> Vec<u8> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.xlsx");
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                worksheet.write_string(r as u32, c as u16, *cell).unwrap();
            }
        }
        workbook.save(&path).unwrap();
        fs::read(&path).unwrap()
    }

    fn part(original_name: &str, bytes: Vec<u8>) -> UploadPart {
        UploadPart {
            field_name: "file".to_string(),
            original_name: original_name.to_string(),
            content_type: Some(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            bytes,
        }
    }

    fn stored_entries(root: &Path) -> usize {
        fs::read_dir(root).map(|dir| dir.count()).unwrap_or(0)
    }

    #[test]
    fn valid_upload_is_stored_and_columns_derived() {
        let root = tempfile::tempdir().unwrap();
        let bytes = xlsx_bytes(&[
            vec!["Month", "Revenue"],
            vec!["Jan", "1200"],
        ]);

        let staged = store_and_extract(root.path(), &part("sales.xlsx", bytes)).unwrap();

        assert_eq!(staged.columns, vec!["Month", "Revenue"]);
        assert!(staged.file_path.exists());
        assert!(staged.file_name.starts_with("file-"));
        assert!(staged.file_name.ends_with(".xlsx"));
        assert_eq!(stored_entries(root.path()), 1);
    }

    #[test]
    fn wrong_extension_leaves_no_bytes_on_disk() {
        let root = tempfile::tempdir().unwrap();
        let result = store_and_extract(root.path(), &part("notes.txt", b"plain text".to_vec()));

        match result {
            Err(AppError::UnsupportedFileType(_)) => {}
            other => panic!("expected UnsupportedFileType, got {:?}", other),
        }
        assert_eq!(stored_entries(root.path()), 0);
    }

    #[test]
    fn empty_workbook_leaves_no_bytes_on_disk() {
        let root = tempfile::tempdir().unwrap();
        let bytes = xlsx_bytes(&[vec!["Header", "Only"]]);

        match store_and_extract(root.path(), &part("empty.xlsx", bytes)) {
            Err(AppError::EmptyDocument(_)) => {}
            other => panic!("expected EmptyDocument, got {:?}", other),
        }
        assert_eq!(stored_entries(root.path()), 0);
    }

    #[test]
    fn unreadable_workbook_leaves_no_bytes_on_disk() {
        let root = tempfile::tempdir().unwrap();
        let result = store_and_extract(
            root.path(),
            &part("corrupt.xlsx", b"not actually a workbook".to_vec()),
        );

        match result {
            Err(AppError::ParseFailure(_)) => {}
            other => panic!("expected ParseFailure, got {:?}", other),
        }
        assert_eq!(stored_entries(root.path()), 0);
    }

    #[test]
    fn boundary_filter_rejects_wrong_mime_before_storage() {
        assert!(check_part("report.xlsx", Some("image/png")).is_err());
        assert!(check_part("report.csv", Some("text/csv")).is_err());
        assert!(check_part(
            "report.xlsx",
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
        )
        .is_ok());
        // missing declared type bypasses only the MIME half
        assert!(check_part("report.xls", None).is_ok());
        assert!(check_part("report.txt", None).is_err());
    }
}
