use crate::database::MongoDB;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::utils::error::AppError;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user id (ObjectId hex)
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub iat: usize,            // issued at
    pub exp: usize,            // expiration
    pub jti: String,           // JWT ID
    pub aud: String,           // audience
    pub iss: String,           // issuer
}

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string())
}

fn get_jwt_issuer() -> String {
    std::env::var("JWT_ISSUER").unwrap_or_else(|_| "sheet-analytics-service".to_string())
}

fn get_jwt_audience() -> String {
    std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "sheet-analytics-api".to_string())
}

// Generate JWT token (24h expiry)
pub fn generate_jwt(user: &User) -> Result<String, AppError> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user.id.map(|id| id.to_hex()).unwrap_or_default(),
        email: user.email.clone(),
        name: user.name.clone(),
        is_admin: user.is_admin,
        iat,
        exp,
        jti,
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[get_jwt_audience()]);

    let mut issuers = HashSet::new();
    issuers.insert(get_jwt_issuer());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthenticated(format!("Invalid token: {}", e)))
}

/// Ownership gate: the caller must own the resource or hold the admin flag.
/// Evaluated freshly on every file/chart operation.
pub fn assert_owner_or_admin(
    claims: &Claims,
    owner: &ObjectId,
    action: &str,
) -> Result<(), AppError> {
    if claims.is_admin || claims.sub == owner.to_hex() {
        return Ok(());
    }
    Err(AppError::Unauthorized(format!(
        "Not authorized to {}",
        action
    )))
}

/// Admin gate for the reporting endpoints.
pub fn assert_admin(claims: &Claims) -> Result<(), AppError> {
    if claims.is_admin {
        return Ok(());
    }
    Err(AppError::Unauthorized("Not authorized as an admin".to_string()))
}

// User registration
pub async fn register(db: &MongoDB, request: &RegisterRequest) -> Result<AuthResponse, AppError> {
    let collection = db.collection::<User>("users");

    if request.name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.password.is_empty()
    {
        return Err(AppError::Validation("Please add all fields".to_string()));
    }

    let existing = collection
        .find_one(doc! { "email": &request.email })
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation("User already exists".to_string()));
    }

    let hashed_password = hash(&request.password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let mut new_user = User {
        id: None,
        name: request.name.clone(),
        email: request.email.clone(),
        password: hashed_password,
        is_admin: false,
        created_at: Some(BsonDateTime::now()),
    };

    let result = collection.insert_one(&new_user).await?;
    new_user.id = result.inserted_id.as_object_id();

    let token = generate_jwt(&new_user)?;

    log::info!("✅ User registered: {}", new_user.email);

    Ok(AuthResponse {
        id: new_user.id.map(|id| id.to_hex()).unwrap_or_default(),
        name: new_user.name,
        email: new_user.email,
        is_admin: new_user.is_admin,
        token,
    })
}

// User login
pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<AuthResponse, AppError> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "email": &request.email })
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Invalid credentials".to_string()))?;

    let valid = verify(&request.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))?;

    if !valid {
        return Err(AppError::Unauthenticated("Invalid credentials".to_string()));
    }

    let token = generate_jwt(&user)?;

    Ok(AuthResponse {
        id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
        name: user.name,
        email: user.email,
        is_admin: user.is_admin,
        token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(is_admin: bool) -> User {
        User {
            id: Some(ObjectId::new()),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password: "not-a-real-digest".to_string(),
            is_admin,
            created_at: Some(BsonDateTime::now()),
        }
    }

    fn claims_for(user: &User) -> Claims {
        let token = generate_jwt(user).unwrap();
        verify_token(&token).unwrap()
    }

    #[test]
    fn jwt_round_trip_preserves_identity_and_admin_flag() {
        let user = sample_user(true);
        let claims = claims_for(&user);
        assert_eq!(claims.sub, user.id.unwrap().to_hex());
        assert_eq!(claims.email, user.email);
        assert!(claims.is_admin);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let user = sample_user(false);
        let mut token = generate_jwt(&user).unwrap();
        token.push('x');
        assert!(verify_token(&token).is_err());
    }

    #[test]
    fn owner_passes_the_gate() {
        let user = sample_user(false);
        let claims = claims_for(&user);
        assert!(assert_owner_or_admin(&claims, &user.id.unwrap(), "access this file").is_ok());
    }

    #[test]
    fn non_owner_is_rejected_unless_admin() {
        let user = sample_user(false);
        let claims = claims_for(&user);
        let other_owner = ObjectId::new();

        match assert_owner_or_admin(&claims, &other_owner, "access this file") {
            Err(AppError::Unauthorized(_)) => {}
            other => panic!("expected Unauthorized, got {:?}", other),
        }

        let admin = sample_user(true);
        let admin_claims = claims_for(&admin);
        assert!(assert_owner_or_admin(&admin_claims, &other_owner, "access this file").is_ok());
    }

    #[test]
    fn admin_gate_requires_the_flag() {
        let claims = claims_for(&sample_user(false));
        assert!(assert_admin(&claims).is_err());

        let admin_claims = claims_for(&sample_user(true));
        assert!(assert_admin(&admin_claims).is_ok());
    }

    #[test]
    fn bcrypt_digest_verifies_original_password_only() {
        let digest = hash("s3cret-pw", DEFAULT_COST).unwrap();
        assert!(verify("s3cret-pw", &digest).unwrap());
        assert!(!verify("wrong-pw", &digest).unwrap());
    }
}
