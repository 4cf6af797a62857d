use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use super::required;
use crate::auth::{AuthUser, TokenSigner};
use crate::db::Database;
use crate::error::ApiError;
use crate::models::user::PublicUser;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub success: bool,
    pub message: String,
    pub user: PublicUser,
    pub token: String,
}

// POST /api/auth/register
pub async fn register(
    db: web::Data<Database>,
    signer: web::Data<TokenSigner>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let (Some(username), Some(password), Some(full_name), Some(email)) = (
        required(&request.username),
        required(&request.password),
        required(&request.full_name),
        required(&request.email),
    ) else {
        return Err(ApiError::Validation(
            "All fields are required: username, password, fullName, email".to_string(),
        ));
    };

    let user: PublicUser = db.register(username, password, full_name, email).await?.into();
    let token = signer.issue(&user)?;

    Ok(HttpResponse::Created().json(SessionResponse {
        success: true,
        message: "User registered successfully".to_string(),
        user,
        token,
    }))
}

// POST /api/auth/login
pub async fn login(
    db: web::Data<Database>,
    signer: web::Data<TokenSigner>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let (Some(username), Some(password)) =
        (required(&request.username), required(&request.password))
    else {
        return Err(ApiError::Validation(
            "Username and password are required".to_string(),
        ));
    };

    let user = db.login(username, password).await?;
    let token = signer.issue(&user)?;

    Ok(HttpResponse::Ok().json(SessionResponse {
        success: true,
        message: "Login successful".to_string(),
        user,
        token,
    }))
}

// GET /api/auth/me
pub async fn me(db: web::Data<Database>, caller: AuthUser) -> Result<HttpResponse, ApiError> {
    let user: PublicUser = db
        .find_user_by_id(caller.id)
        .await
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?
        .into();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": user,
    })))
}
