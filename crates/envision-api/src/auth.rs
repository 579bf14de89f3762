use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{info, warn};

use envision_db::Database;
use envision_db::models::NewUser;
use envision_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::catalog::Catalog;
use crate::error::ApiError;
use crate::service::CommentService;

/// Access tokens are valid for five hours.
pub const TOKEN_LIFETIME_HOURS: i64 = 5;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub comments: CommentService,
    pub catalog: Catalog,
    pub jwt_secret: String,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, catalog: Catalog, jwt_secret: String) -> AppState {
        Arc::new(Self {
            comments: CommentService::new(Arc::clone(&db)),
            db,
            catalog,
            jwt_secret,
        })
    }
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(req) = body?;
    validate_registration(&req)?;

    if state.db.get_user_by_username(&req.username)?.is_some() {
        return Err(ApiError::Conflict("This username already exists.".into()));
    }
    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::Conflict("This email already exists.".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    // A concurrent registration can still win the UNIQUE race after the checks above.
    let id = state
        .db
        .create_user(&NewUser {
            username: &req.username,
            password_hash: &password_hash,
            email: &req.email,
            first_name: &req.first_name,
            last_name: &req.last_name,
            grade: req.grade,
        })?
        .ok_or_else(|| ApiError::Conflict("This username or email already exists.".into()))?;

    info!(user_id = id, username = %req.username, "registered user");

    let access_token = create_token(&state.jwt_secret, id, &req.username)?;
    Ok(Json(RegisterResponse { access_token, id }))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = body?;
    let invalid = || ApiError::Unauthorized("Invalid username or password.".into());

    let user = state
        .db
        .get_user_by_username(&req.username)?
        .ok_or_else(invalid)?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored hash for user {} is unreadable: {}", user.id, e))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| {
            warn!(username = %req.username, "failed login");
            invalid()
        })?;

    let access_token = create_token(&state.jwt_secret, user.id, &user.username)?;
    Ok(Json(LoginResponse {
        access_token,
        id: user.id,
        username: user.username,
    }))
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    let username_len = req.username.chars().count();
    if !(3..=20).contains(&username_len) {
        return Err(ApiError::Validation(
            "Username must be between 3 and 20 characters.".into(),
        ));
    }
    if req.password.chars().count() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters.".into(),
        ));
    }
    if !req.email.contains('@') || req.email.chars().count() > 80 {
        return Err(ApiError::Validation("Invalid email address.".into()));
    }
    for name in [&req.first_name, &req.last_name] {
        let len = name.trim().chars().count();
        if len == 0 || len > 20 {
            return Err(ApiError::Validation(
                "Names must be between 1 and 20 characters.".into(),
            ));
        }
    }
    Ok(())
}

pub fn create_token(secret: &str, user_id: i64, username: &str) -> anyhow::Result<String> {
    let exp = chrono::Utc::now() + chrono::Duration::hours(TOKEN_LIFETIME_HOURS);
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: usize::try_from(exp.timestamp())?,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Check signature and expiry, returning the verified claims.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {e}")))
}
