use actix_web::{HttpResponse, http::header, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::{
    api::settings::{SettingsView, load_or_init_settings},
    auth::auth::AuthUser,
    error::AppError,
    model::{
        attendance::{AttendanceFilter, AttendanceRecord, AttendanceStatus, NewAttendance},
        clock_time::ClockTime,
    },
    models::ApiResponse,
    rules::{
        clock::Clock,
        export::{attendance_csv, export_filename},
        window::{Rejection, can_submit},
    },
    store::{Store, StoreError},
};

#[derive(Deserialize, ToSchema)]
pub struct SubmitAttendance {
    /// H, I, S or A
    #[schema(example = "H", value_type = Option<String>)]
    pub status: Option<AttendanceStatus>,
    #[schema(example = "Hadir tepat waktu")]
    pub note: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MemberAttendanceStatus {
    #[serde(flatten)]
    pub view: SettingsView,
    pub has_submitted: bool,
}

/// Window state for the signed-in member.
#[utoipa::path(
    get,
    path = "/api/attendance/status",
    responses(
        (status = 200, description = "Settings, window state and whether today's record exists", body = MemberAttendanceStatus),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Members only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_status(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, AppError> {
    auth.require_member()?;

    let settings = load_or_init_settings(store.get_ref(), clock.get_ref()).await?;
    let has_submitted = store.has_attendance(&auth.user_id, clock.today()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(MemberAttendanceStatus {
        view: SettingsView::new(settings, clock.get_ref()),
        has_submitted,
    })))
}

/// Submit today's attendance
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = SubmitAttendance,
    responses(
        (status = 201, description = "Attendance recorded", body = AttendanceRecord),
        (status = 400, description = "No status, already submitted, window closed or outside hours", body = Object, example = json!({
            "success": false,
            "error": "Anda sudah mengisi absensi hari ini",
            "code": "already-submitted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Members only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn submit_attendance(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    clock: web::Data<dyn Clock>,
    payload: web::Json<SubmitAttendance>,
) -> Result<HttpResponse, AppError> {
    auth.require_member()?;

    let payload = payload.into_inner();
    let status = payload
        .status
        .ok_or_else(|| AppError::validation("Pilih status kehadiran terlebih dahulu!"))?;

    let now = clock.now_local();
    let today = now.date();

    let already_submitted = store.has_attendance(&auth.user_id, today).await?;
    let settings = load_or_init_settings(store.get_ref(), clock.get_ref()).await?;

    if let Err(rejection) = can_submit(&settings, now, already_submitted) {
        info!(user_id = %auth.user_id, reason = %rejection, "Attendance rejected");
        return Err(rejection.into());
    }

    // Denormalize the profile as it is right now.
    let user = store
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Pengguna tidak ditemukan"))?;

    let record = store
        .insert_attendance(NewAttendance {
            user_id: user.id,
            name: user.name,
            position: user.position,
            region: user.region,
            institution: user.institution,
            status,
            note: payload.note.map(|n| n.trim().to_string()).unwrap_or_default(),
            date: today,
            submitted_at: ClockTime::from_time(now.time()),
            created_at: clock.now_utc(),
        })
        .await
        .map_err(|e| match e {
            // Lost the race against a concurrent submission.
            StoreError::AlreadyExists => {
                warn!(user_id = %auth.user_id, "Duplicate attendance blocked by store");
                AppError::Rejected(Rejection::AlreadySubmitted)
            }
            other => {
                error!(error = %other, user_id = %auth.user_id, "Attendance insert failed");
                AppError::Store(other)
            }
        })?;

    info!(user_id = %record.user_id, status = %record.status, "Attendance submitted");
    Ok(HttpResponse::Created().json(ApiResponse::ok(record)))
}

/// Own attendance history, newest first.
#[utoipa::path(
    get,
    path = "/api/attendance/me",
    responses(
        (status = 200, description = "Attendance history of the signed-in user", body = [AttendanceRecord]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn my_attendances(
    auth: AuthUser,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let records = store
        .list_attendances(&AttendanceFilter::for_user(&auth.user_id))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(records)))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Attendance records, newest first", body = [AttendanceRecord]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendances(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<AttendanceFilter>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let records = store.list_attendances(&query).await.map_err(|e| {
        error!(error = %e, "Failed to list attendances");
        AppError::Store(e)
    })?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(records)))
}

/// CSV download of the (filtered) attendance list.
#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Nothing to export")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn export_attendances(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    clock: web::Data<dyn Clock>,
    query: web::Query<AttendanceFilter>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let records = store.list_attendances(&query).await?;
    if records.is_empty() {
        return Err(AppError::not_found("Tidak ada data untuk diexport"));
    }

    let filename = export_filename(clock.today());
    info!(rows = records.len(), %filename, "Attendance exported");

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(attendance_csv(&records)))
}
