use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Uploaded spreadsheet metadata (stored in the `files` collection).
///
/// `columns` is derived once at upload time from the first parsed row and is
/// not re-validated against the stored bytes on later reads.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct File {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user: ObjectId,
    pub original_name: String,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub size: i64,
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<BsonDateTime>,
}

/// File record with hex ids, as served to clients.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub original_name: String,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub size: i64,
    pub columns: Vec<String>,
    pub created_at: Option<String>,
}

impl From<File> for FileResponse {
    fn from(file: File) -> Self {
        FileResponse {
            id: file.id.map(|id| id.to_hex()).unwrap_or_default(),
            user: file.user.to_hex(),
            original_name: file.original_name,
            file_name: file.file_name,
            file_path: file.file_path,
            file_type: file.file_type,
            size: file.size,
            columns: file.columns,
            created_at: file
                .created_at
                .and_then(|d| d.try_to_rfc3339_string().ok()),
        }
    }
}

/// Retrieval pipeline result: metadata plus the freshly re-parsed rows.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileDataResponse {
    pub file: FileResponse,
    #[schema(value_type = Vec<Object>)]
    pub parsed_data: Vec<Map<String, Value>>,
    pub columns: Vec<String>,
}
