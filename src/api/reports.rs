use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::attendance::AttendanceFilter,
    models::ApiResponse,
    rules::stats::StatusBreakdown,
    store::Store,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ReportQuery {
    /// First day of the period (YYYY-MM-DD), inclusive
    #[param(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    /// Last day of the period (YYYY-MM-DD), inclusive
    #[param(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceReport {
    #[schema(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
    /// Distinct days with at least one record
    pub days: u64,
    pub breakdown: StatusBreakdown,
}

/// H/I/S/A rates over a date range. Open ends cover all history.
#[utoipa::path(
    get,
    path = "/api/reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Status breakdown for the period", body = AttendanceReport),
        (status = 400, description = "Start date after end date"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn attendance_report(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let ReportQuery { from, to } = query.into_inner();
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(AppError::validation(
                "Tanggal awal tidak boleh melewati tanggal akhir",
            ));
        }
    }

    let records = store
        .list_attendances(&AttendanceFilter::between(from, to))
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to load report records");
            AppError::Store(e)
        })?;

    let mut dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
    dates.sort_unstable();
    dates.dedup();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(AttendanceReport {
        from,
        to,
        days: dates.len() as u64,
        breakdown: StatusBreakdown::tally(records.iter().map(|r| r.status)),
    })))
}
