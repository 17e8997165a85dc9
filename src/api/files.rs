use crate::database::MongoDB;
use crate::models::{FileDataResponse, FileResponse};
use crate::services::auth_service::Claims;
use crate::services::file_service::{self, UploadPart};
use crate::utils::error::AppError;
use crate::utils::storage::MAX_UPLOAD_BYTES;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::StreamExt;

#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "Files",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded and parsed", body = FileResponse),
        (status = 400, description = "Missing file, unsupported type, or empty spreadsheet"),
        (status = 413, description = "File exceeds the upload limit")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_file(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    log::info!("📤 POST /api/files/upload - user: {}", user.sub);

    let mut part: Option<UploadPart> = None;

    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?;

        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if field_name.as_deref() != Some("file") {
            continue;
        }

        let original_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .ok_or_else(|| AppError::Validation("Please upload a file".to_string()))?;
        let content_type = field.content_type().map(|mime| mime.to_string());

        // boundary filter runs before any byte is buffered or stored
        file_service::check_part(&original_name, content_type.as_deref())?;

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?;
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::PayloadTooLarge(
                    "File exceeds the 10 MiB upload limit".to_string(),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        part = Some(UploadPart {
            field_name: "file".to_string(),
            original_name,
            content_type,
            bytes,
        });
    }

    let part = part.ok_or_else(|| AppError::Validation("Please upload a file".to_string()))?;

    let file = file_service::save_upload(&db, &user, part).await?;
    Ok(HttpResponse::Created().json(FileResponse::from(file)))
}

#[utoipa::path(
    get,
    path = "/api/files",
    tag = "Files",
    responses(
        (status = 200, description = "Caller's files, newest first", body = [FileResponse])
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user_files(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let files = file_service::list_files(&db, &user).await?;
    let response: Vec<FileResponse> = files.into_iter().map(FileResponse::from).collect();
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "Files",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 200, description = "File metadata plus re-parsed rows", body = FileDataResponse),
        (status = 403, description = "Caller is neither owner nor admin"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_file_by_id(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let file_id = path.into_inner();
    let (file, parsed) = file_service::get_file(&db, &user, &file_id).await?;

    Ok(HttpResponse::Ok().json(FileDataResponse {
        columns: file.columns.clone(),
        file: FileResponse::from(file),
        parsed_data: parsed.rows,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "Files",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 200, description = "File and backing bytes removed"),
        (status = 403, description = "Caller is neither owner nor admin"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_file(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let file_id = path.into_inner();
    file_service::delete_file(&db, &user, &file_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "File removed" })))
}
