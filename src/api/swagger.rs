use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sheet Analytics Service API",
        version = "1.0.0",
        description = "Spreadsheet analytics backend: upload Excel files, inspect their tabular contents, and save 2D/3D chart configurations.\n\n**Authentication:** All file, chart, and admin endpoints require a JWT Bearer token obtained from register or login."
    ),
    paths(
        // Users
        crate::api::users::register,
        crate::api::users::login,

        // Health
        crate::api::health::health_check,

        // Files
        crate::api::files::upload_file,
        crate::api::files::get_user_files,
        crate::api::files::get_file_by_id,
        crate::api::files::delete_file,

        // Charts
        crate::api::charts::create_chart,
        crate::api::charts::get_user_charts,
        crate::api::charts::get_chart_by_id,
        crate::api::charts::delete_chart,

        // Admin
        crate::api::admin::get_users,
        crate::api::admin::get_stats,
    ),
    components(
        schemas(
            // Users
            crate::models::RegisterRequest,
            crate::models::LoginRequest,
            crate::models::AuthResponse,

            // Health
            crate::api::health::HealthResponse,

            // Files
            crate::models::FileResponse,
            crate::models::FileDataResponse,

            // Charts
            crate::models::ChartType,
            crate::models::CreateChartRequest,
            crate::models::ChartFileRef,
            crate::models::ChartResponse,

            // Admin
            crate::services::admin_service::AdminUserResponse,
            crate::services::admin_service::StatsResponse,
        )
    ),
    tags(
        (name = "Users", description = "Registration and login. Both return the user's identity plus a signed JWT."),
        (name = "Files", description = "Spreadsheet upload, listing, retrieval (with on-demand re-parse), and deletion."),
        (name = "Charts", description = "Saved chart configurations referencing uploaded files."),
        (name = "Admin", description = "Admin-only reporting: per-user file/chart counts and global storage totals."),
        (name = "Health", description = "Health check endpoint for monitoring service status."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build()
                ),
            );
        }
    }
}
