use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::{role::Role, user::User};

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "Siti Rahma")]
    pub name: String,
    #[schema(example = "siti@foksi.id", format = "email")]
    pub email: String,
    #[schema(example = "rahasia123")]
    pub password: String,
    #[schema(example = "rahasia123")]
    pub confirm_password: String,
    #[schema(example = "Ketua Regional")]
    pub position: Option<String>,
    #[schema(example = "Jawa Barat")]
    pub region: Option<String>,
    #[schema(example = "SMAN 1 Bandung")]
    pub institution: Option<String>,
    #[schema(example = "081234567890")]
    pub phone: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "siti@foksi.id", format = "email")]
    pub email: String,
    pub password: String,
    /// Login page the user came from; a different stored role is rejected.
    #[schema(example = "anggota")]
    pub role: Option<Role>,
}

#[derive(Deserialize, ToSchema)]
pub struct RefreshReq {
    pub refresh_token: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}

/// Success envelope shared by every JSON endpoint.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data,
        }
    }
}
