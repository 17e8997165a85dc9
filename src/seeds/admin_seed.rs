use crate::database::MongoDB;
use crate::models::User;
use bcrypt::{hash, DEFAULT_COST};
use mongodb::bson::{doc, DateTime as BsonDateTime};

fn admin_email() -> String {
    std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string())
}

fn admin_password() -> String {
    std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string())
}

/// Seeds the administrator account on startup. Idempotent: does nothing if
/// a user with the configured admin email already exists.
pub async fn seed_admin(db: &MongoDB) {
    let collection = db.collection::<User>("users");
    let email = admin_email();

    match collection.find_one(doc! { "email": &email }).await {
        Ok(Some(_)) => {
            log::info!("👤 Admin user already exists: {}", email);
            return;
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("❌ Failed to check for admin user: {}", e);
            return;
        }
    }

    let hashed_password = match hash(admin_password(), DEFAULT_COST) {
        Ok(digest) => digest,
        Err(e) => {
            log::error!("❌ Failed to hash admin password: {}", e);
            return;
        }
    };

    let admin = User {
        id: None,
        name: "Admin User".to_string(),
        email: email.clone(),
        password: hashed_password,
        is_admin: true,
        created_at: Some(BsonDateTime::now()),
    };

    match collection.insert_one(&admin).await {
        Ok(_) => log::info!("👤 Admin user created: {}", email),
        Err(e) => log::error!("❌ Failed to seed admin user: {}", e),
    }
}
