use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use crate::models::TokenType;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use super::jwt::verify_token;

/// The signed-in user for the current request. Built from the bearer token,
/// never from shared state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn from_bearer(header: Option<&str>, config: &Config) -> Result<Self, AppError> {
        let token = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::unauthorized("Token tidak ditemukan"))?;

        let claims = verify_token(token, &config.jwt_secret)
            .map_err(|_| AppError::unauthorized("Sesi tidak valid atau sudah berakhir"))?;

        if claims.token_type != TokenType::Access {
            return Err(AppError::unauthorized("Sesi tidak valid atau sudah berakhir"));
        }

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role: claims.role,
        })
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::forbidden(
                "Akses ditolak! Hanya admin yang bisa mengakses halaman ini.",
            ))
        }
    }

    pub fn require_member(&self) -> Result<(), AppError> {
        if self.role == Role::Member {
            Ok(())
        } else {
            Err(AppError::forbidden(
                "Akses ditolak! Hanya anggota yang bisa mengakses halaman ini.",
            ))
        }
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already resolved by auth_middleware on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(AppError::Internal("config missing".to_string())));
        };

        let header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok());

        ready(AuthUser::from_bearer(header, config))
    }
}
