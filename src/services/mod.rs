pub mod admin_service;
pub mod auth_service;
pub mod chart_service;
pub mod file_service;
