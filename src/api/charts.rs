use crate::database::MongoDB;
use crate::models::{ChartResponse, CreateChartRequest};
use crate::services::auth_service::Claims;
use crate::services::chart_service;
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};

#[utoipa::path(
    post,
    path = "/api/charts",
    tag = "Charts",
    request_body = CreateChartRequest,
    responses(
        (status = 201, description = "Chart created", body = ChartResponse),
        (status = 403, description = "Caller does not own the referenced file"),
        (status = 404, description = "Referenced file not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_chart(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    request: web::Json<CreateChartRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!(
        "📊 POST /api/charts - user: {}, file: {}",
        user.sub,
        request.file_id
    );

    let chart = chart_service::create_chart(&db, &user, &request).await?;
    Ok(HttpResponse::Created().json(chart))
}

#[utoipa::path(
    get,
    path = "/api/charts",
    tag = "Charts",
    responses(
        (status = 200, description = "Caller's charts, newest first", body = [ChartResponse])
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user_charts(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let charts = chart_service::list_charts(&db, &user).await?;
    Ok(HttpResponse::Ok().json(charts))
}

#[utoipa::path(
    get,
    path = "/api/charts/{id}",
    tag = "Charts",
    params(("id" = String, Path, description = "Chart id")),
    responses(
        (status = 200, description = "Chart joined with its file's display name", body = ChartResponse),
        (status = 403, description = "Caller is neither owner nor admin"),
        (status = 404, description = "Chart not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_chart_by_id(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let chart_id = path.into_inner();
    let chart = chart_service::get_chart(&db, &user, &chart_id).await?;
    Ok(HttpResponse::Ok().json(chart))
}

#[utoipa::path(
    delete,
    path = "/api/charts/{id}",
    tag = "Charts",
    params(("id" = String, Path, description = "Chart id")),
    responses(
        (status = 200, description = "Chart removed; the referenced file is untouched"),
        (status = 403, description = "Caller is neither owner nor admin"),
        (status = 404, description = "Chart not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_chart(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let chart_id = path.into_inner();
    chart_service::delete_chart(&db, &user, &chart_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Chart removed" })))
}
