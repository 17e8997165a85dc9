mod api;
mod database;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let upload_dir = utils::storage::upload_root();

    log::info!("🚀 Starting Sheet Analytics Service...");
    log::info!("📊 Database: {}", database_url);

    // Uploaded bytes live under this root; also served statically at /uploads
    std::fs::create_dir_all(&upload_dir)?;
    log::info!("📁 Upload root: {}", upload_dir.display());

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_data = web::Data::new(db.clone());

    log::info!("✅ MongoDB connected successfully");

    // 🌱 Seed the admin account
    seeds::admin_seed::seed_admin(&db).await;

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Users: register + login (no auth)
            .service(
                web::scope("/api/users")
                    .route("/register", web::post().to(api::users::register))
                    .route("/login", web::post().to(api::users::login))
            )
            // Files: upload pipeline + retrieval (JWT required)
            .service(
                web::scope("/api/files")
                    .wrap(middleware::AuthMiddleware)
                    .route("/upload", web::post().to(api::files::upload_file))
                    .route("", web::get().to(api::files::get_user_files))
                    .route("/{id}", web::get().to(api::files::get_file_by_id))
                    .route("/{id}", web::delete().to(api::files::delete_file))
            )
            // Charts: saved visualization configurations (JWT required)
            .service(
                web::scope("/api/charts")
                    .wrap(middleware::AuthMiddleware)
                    .route("", web::post().to(api::charts::create_chart))
                    .route("", web::get().to(api::charts::get_user_charts))
                    .route("/{id}", web::get().to(api::charts::get_chart_by_id))
                    .route("/{id}", web::delete().to(api::charts::delete_chart))
            )
            // Admin reporting (JWT required; admin flag checked per handler)
            .service(
                web::scope("/api/admin")
                    .wrap(middleware::AuthMiddleware)
                    .route("/users", web::get().to(api::admin::get_users))
                    .route("/stats", web::get().to(api::admin::get_stats))
            )
            // Raw stored bytes, served statically. No access control here:
            // any caller knowing a generated filename can fetch them.
            .service(actix_files::Files::new("/uploads", utils::storage::upload_root()))
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
