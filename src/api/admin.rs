use crate::database::MongoDB;
use crate::services::admin_service::{self, AdminUserResponse, StatsResponse};
use crate::services::auth_service::Claims;
use crate::utils::error::AppError;
use actix_web::{web, HttpResponse};

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    responses(
        (status = 200, description = "All users with owned file/chart counts, newest first", body = [AdminUserResponse]),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_users(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let users = admin_service::users_with_counts(&db, &user).await?;
    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "Admin",
    responses(
        (status = 200, description = "Global totals and summed storage", body = StatsResponse),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_stats(
    db: web::Data<MongoDB>,
    user: web::ReqData<Claims>,
) -> Result<HttpResponse, AppError> {
    let stats = admin_service::global_stats(&db, &user).await?;
    Ok(HttpResponse::Ok().json(stats))
}
