use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::{auth::AuthUser, handlers::register_member},
    error::AppError,
    model::{
        attendance::{AttendanceFilter, AttendanceRecord},
        role::Role,
        user::{User, UserPatch},
    },
    models::{ApiResponse, RegisterReq},
    store::Store,
    utils::email_registry::EmailRegistry,
};

const RECENT_RECORDS: usize = 5;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct MemberQuery {
    /// Case-insensitive match on name, email, position or region
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MemberDetail {
    pub member: User,
    /// Five latest attendance records
    pub recent: Vec<AttendanceRecord>,
}

/// Member list handler
#[utoipa::path(
    get,
    path = "/api/members",
    params(MemberQuery),
    responses(
        (status = 200, description = "Members", body = [User]),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Members"
)]
pub async fn list_members(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<MemberQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let mut members = store.list_users(Some(Role::Member)).await.map_err(|e| {
        error!(error = %e, "Failed to list members");
        AppError::Store(e)
    })?;

    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        members.retain(|m| m.matches(term));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(members)))
}

#[utoipa::path(
    get,
    path = "/api/members/{id}",
    params(
        ("id" = String, Path, description = "Member id")
    ),
    responses(
        (status = 200, description = "Member with latest attendance", body = MemberDetail),
        (status = 404, description = "Member not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Members"
)]
pub async fn get_member(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let id = path.into_inner();
    let member = find_member(store.get_ref(), &id).await?;

    let mut recent = store
        .list_attendances(&AttendanceFilter::for_user(&id))
        .await?;
    recent.truncate(RECENT_RECORDS);

    Ok(HttpResponse::Ok().json(ApiResponse::ok(MemberDetail { member, recent })))
}

/// Admin "add member" form; same rules as self-registration.
#[utoipa::path(
    post,
    path = "/api/members",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Member created", body = User),
        (status = 400, description = "Invalid form"),
        (status = 409, description = "Email already in use")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Members"
)]
pub async fn create_member(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    emails: web::Data<EmailRegistry>,
    payload: web::Json<RegisterReq>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let user = register_member(&payload, store.get_ref(), &emails).await?;
    info!(admin = %auth.user_id, user_id = %user.id, "Member added");

    Ok(HttpResponse::Created().json(ApiResponse::ok(user)))
}

/// Only member accounts are reachable through these routes.
async fn find_member(store: &dyn Store, id: &str) -> Result<User, AppError> {
    store
        .get_user(id)
        .await?
        .filter(|u| u.role == Role::Member)
        .ok_or_else(|| AppError::not_found("Anggota tidak ditemukan"))
}

fn trimmed(patch: UserPatch) -> Result<UserPatch, AppError> {
    let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
    let patch = UserPatch {
        name: trim(patch.name),
        position: trim(patch.position),
        region: trim(patch.region),
        institution: trim(patch.institution),
        phone: trim(patch.phone),
    };

    if patch.name.as_deref() == Some("") {
        return Err(AppError::validation("Nama wajib diisi"));
    }
    if patch.is_empty() {
        return Err(AppError::validation("Tidak ada data yang diubah"));
    }
    Ok(patch)
}

#[utoipa::path(
    put,
    path = "/api/members/{id}",
    params(
        ("id" = String, Path, description = "Member id")
    ),
    request_body = UserPatch,
    responses(
        (status = 200, description = "Updated member", body = User),
        (status = 400, description = "Nothing to update"),
        (status = 404, description = "Member not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Members"
)]
pub async fn update_member(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<String>,
    payload: web::Json<UserPatch>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let id = path.into_inner();
    let patch = trimmed(payload.into_inner())?;
    find_member(store.get_ref(), &id).await?;

    let updated = store.update_user(&id, &patch).await.map_err(|e| {
        error!(error = %e, user_id = %id, "Failed to update member");
        AppError::Store(e)
    })?;
    if !updated {
        return Err(AppError::not_found("Anggota tidak ditemukan"));
    }

    let user = store
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Anggota tidak ditemukan"))?;
    info!(admin = %auth.user_id, user_id = %id, "Member updated");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(user)))
}

/// Removes the account. Attendance history is kept.
#[utoipa::path(
    delete,
    path = "/api/members/{id}",
    params(
        ("id" = String, Path, description = "Member id")
    ),
    responses(
        (status = 200, description = "Member deleted"),
        (status = 404, description = "Member not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Members"
)]
pub async fn delete_member(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    emails: web::Data<EmailRegistry>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let id = path.into_inner();
    find_member(store.get_ref(), &id).await?;

    let removed = store
        .delete_user(&id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %id, "Failed to delete member");
            AppError::Store(e)
        })?
        .ok_or_else(|| AppError::not_found("Anggota tidak ditemukan"))?;

    emails.release(&removed.email).await;
    info!(admin = %auth.user_id, user_id = %id, "Member deleted");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({ "id": removed.id }))))
}
