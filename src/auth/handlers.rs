use crate::{
    auth::{
        auth::AuthUser,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{check_new_password, hash_password, verify_password},
    },
    config::Config,
    error::AppError,
    model::{
        role::Role,
        user::{DEFAULT_INSTITUTION, DEFAULT_POSITION, DEFAULT_REGION, NewUser, User},
    },
    models::{ApiResponse, LoginReqDto, LoginResponse, RefreshReq, RegisterReq, TokenType},
    store::{Store, StoreError},
    utils::email_registry::EmailRegistry,
};
use actix_web::{HttpResponse, web};
use chrono::{TimeZone, Utc};
use serde_json::json;
use tracing::{debug, error, info, instrument};

fn or_default(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Validates the form, checks the email and creates a member account.
/// Shared by self-registration and the admin "add member" form.
pub async fn register_member(
    req: &RegisterReq,
    store: &dyn Store,
    emails: &EmailRegistry,
) -> Result<User, AppError> {
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(AppError::validation("Nama wajib diisi"));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("Email tidak valid"));
    }
    check_new_password(&req.password, &req.confirm_password).map_err(AppError::validation)?;

    if !emails.is_available(&email, store).await? {
        return Err(AppError::Conflict("Email sudah digunakan".to_string()));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        AppError::Internal("password hashing failed".to_string())
    })?;

    let user = store
        .create_user(NewUser {
            name: name.to_string(),
            email,
            password_hash,
            role: Role::Member,
            position: or_default(&req.position, DEFAULT_POSITION),
            region: or_default(&req.region, DEFAULT_REGION),
            institution: or_default(&req.institution, DEFAULT_INSTITUTION),
            phone: or_default(&req.phone, ""),
        })
        .await
        .map_err(|e| match e {
            StoreError::AlreadyExists => AppError::Conflict("Email sudah digunakan".to_string()),
            other => {
                error!(error = %other, "Failed to create user");
                AppError::Store(other)
            }
        })?;

    emails.mark_taken(&user.email).await;
    Ok(user)
}

/// User registration handler
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Member registered", body = Object, example = json!({
            "success": true,
            "data": { "uid": "3f1c2a9e-8d57-4e0b-9a43-5b1c1d2e7f10" }
        })),
        (status = 400, description = "Password mismatch or too short"),
        (status = 409, description = "Email already in use")
    ),
    tag = "Auth"
)]
pub async fn register(
    payload: web::Json<RegisterReq>,
    store: web::Data<dyn Store>,
    emails: web::Data<EmailRegistry>,
) -> Result<HttpResponse, AppError> {
    let user = register_member(&payload, store.get_ref(), &emails).await?;
    info!(user_id = %user.id, "Member registered");

    Ok(HttpResponse::Created().json(ApiResponse::ok(json!({ "uid": user.id }))))
}

async fn issue_tokens(
    user: &User,
    store: &dyn Store,
    config: &Config,
) -> Result<(String, String), AppError> {
    let signing_failed = |e: jsonwebtoken::errors::Error| {
        error!(error = %e, "Failed to sign token");
        AppError::Internal("token signing failed".to_string())
    };

    let access_token = generate_access_token(
        &user.id,
        &user.email,
        user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(signing_failed)?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        &user.id,
        &user.email,
        user.role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(signing_failed)?;

    debug!(user_id = %user.id, jti = %refresh_claims.jti, "Storing refresh token");

    let expires_at = Utc
        .timestamp_opt(refresh_claims.exp as i64, 0)
        .single()
        .ok_or_else(|| AppError::Internal("refresh expiry out of range".to_string()))?;

    store
        .store_refresh_token(&user.id, &refresh_claims.jti, expires_at)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to store refresh token");
            AppError::Store(e)
        })?;

    Ok((access_token, refresh_token))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Wrong email or password"),
        (status = 403, description = "Account has a different role")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, payload),
    fields(email = %payload.email)
)]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    // Basic validation
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(AppError::validation("Email dan password wajib diisi"));
    }

    // Fetch credentials
    let credentials = store
        .find_credentials(payload.email.trim())
        .await
        .map_err(|e| {
            error!(error = %e, "Store error while fetching user");
            AppError::Store(e)
        })?
        .ok_or_else(|| {
            info!("Invalid credentials: user not found");
            AppError::unauthorized("Pengguna tidak ditemukan")
        })?;

    // Verify password
    if let Err(e) = verify_password(&payload.password, &credentials.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::unauthorized("Password salah"));
    }

    let user = credentials.user;

    // Role must match the login page
    if let Some(expected) = payload.role {
        if expected != user.role {
            info!(actual = %user.role, expected = %expected, "Role mismatch");
            return Err(AppError::forbidden(format!(
                "Anda terdaftar sebagai {}, bukan {}",
                user.role, expected
            )));
        }
    }

    // Tokens
    let (access_token, refresh_token) = issue_tokens(&user, store.get_ref(), &config).await?;

    info!(user_id = %user.id, "Login successful");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(LoginResponse {
        access_token,
        refresh_token,
        user,
    })))
}

/// Current profile for a live session.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Signed-in user", body = User),
        (status = 401, description = "No or expired session")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser, store: web::Data<dyn Store>) -> Result<HttpResponse, AppError> {
    let user = store
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Pengguna tidak ditemukan"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(user)))
}

/// Rotates a refresh token: the old one is revoked, a new pair is issued.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshReq,
    responses(
        (status = 200, description = "New token pair", body = Object),
        (status = 401, description = "Refresh token invalid, expired or revoked")
    ),
    tag = "Auth"
)]
pub async fn refresh_token(
    payload: web::Json<RefreshReq>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let invalid = || AppError::unauthorized("Sesi tidak valid atau sudah berakhir");

    let claims = verify_token(&payload.refresh_token, &config.jwt_secret).map_err(|_| invalid())?;
    if claims.token_type != TokenType::Refresh {
        return Err(invalid());
    }

    // revoke old refresh token
    let owner = store.revoke_refresh_token(&claims.jti).await?;
    if owner.as_deref() != Some(claims.user_id.as_str()) {
        return Err(invalid());
    }

    // Deleted users cannot refresh.
    let user = store.get_user(&claims.user_id).await?.ok_or_else(invalid)?;

    let (access_token, refresh_token) = issue_tokens(&user, store.get_ref(), &config).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({
        "access_token": access_token,
        "refresh_token": refresh_token
    }))))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    request_body = RefreshReq,
    responses(
        (status = 204, description = "Signed out (also when the token was unknown)")
    ),
    tag = "Auth"
)]
pub async fn logout(
    payload: web::Json<RefreshReq>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> HttpResponse {
    // only refresh tokens can logout
    let Ok(claims) = verify_token(&payload.refresh_token, &config.jwt_secret) else {
        return HttpResponse::NoContent().finish();
    };
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    // revoke (idempotent)
    if let Err(e) = store.revoke_refresh_token(&claims.jti).await {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}
