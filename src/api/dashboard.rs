use actix_web::{HttpResponse, web};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::{
    api::settings::{SettingsView, load_or_init_settings},
    auth::auth::AuthUser,
    error::AppError,
    model::{
        attendance::{AttendanceFilter, AttendanceRecord},
        role::Role,
    },
    models::ApiResponse,
    rules::{activity::time_ago, clock::Clock, stats::AttendanceStats},
    store::{Store, StoreError},
};

const RECENT_ACTIVITY: usize = 5;

#[derive(Serialize, ToSchema)]
pub struct RecentActivity {
    pub record: AttendanceRecord,
    #[schema(example = "5 menit yang lalu")]
    pub time_ago: String,
}

#[derive(Serialize, ToSchema)]
pub struct Dashboard {
    pub stats: AttendanceStats,
    pub attendance: SettingsView,
    /// Today's records, newest first
    pub today: Vec<AttendanceRecord>,
    pub recent: Vec<RecentActivity>,
}

fn logged(context: &'static str) -> impl Fn(StoreError) -> AppError {
    move |e| {
        error!(error = %e, "{}", context);
        AppError::Store(e)
    }
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Counts, attendance rate, window state and recent activity", body = Dashboard),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn dashboard(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let today = clock.today();

    let member_count = store
        .count_users(Some(Role::Member))
        .await
        .map_err(logged("Failed to count members"))?;
    let today_count = store
        .count_attendances(Some(today))
        .await
        .map_err(logged("Failed to count today's attendance"))?;
    let total_count = store
        .count_attendances(None)
        .await
        .map_err(logged("Failed to count attendance"))?;

    let todays = store
        .list_attendances(&AttendanceFilter::for_date(today))
        .await
        .map_err(logged("Failed to list today's attendance"))?;

    let mut latest = store
        .list_attendances(&AttendanceFilter::default())
        .await
        .map_err(logged("Failed to list recent attendance"))?;
    latest.truncate(RECENT_ACTIVITY);

    let now = clock.now_utc();
    let recent = latest
        .into_iter()
        .map(|record| RecentActivity {
            time_ago: time_ago(record.created_at, now),
            record,
        })
        .collect();

    let settings = load_or_init_settings(store.get_ref(), clock.get_ref()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(Dashboard {
        stats: AttendanceStats::from_counts(member_count, today_count, total_count),
        attendance: SettingsView::new(settings, clock.get_ref()),
        today: todays,
        recent,
    })))
}

#[cfg(test)]
mod tests {
    use crate::model::role::Role;
    use crate::test_support::TestContext;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn empty_dashboard_has_zero_rate() {
        let ctx = TestContext::at("2024-01-01 09:00");
        let admin = ctx.user("admin@foksi.id", Role::Admin).await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let resp = test::call_service(&app, ctx.get("/api/dashboard", &admin).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["stats"]["member_count"], 0);
        assert_eq!(body["data"]["stats"]["attendance_rate"], 0);
        assert_eq!(body["data"]["attendance"]["window"], "inactive");
        assert_eq!(body["data"]["recent"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn counts_rate_and_recent_activity() {
        let ctx = TestContext::at("2024-01-01 09:00");
        let admin = ctx.user("admin@foksi.id", Role::Admin).await;
        let siti = ctx.user("siti@foksi.id", Role::Member).await;
        ctx.user("budi@foksi.id", Role::Member).await;
        ctx.user("rina@foksi.id", Role::Member).await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let resp =
            test::call_service(&app, ctx.post("/api/settings/open", &admin).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = test::call_service(
            &app,
            ctx.post("/api/attendance", &siti)
                .set_json(json!({ "status": "H" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        ctx.clock.advance(chrono::Duration::minutes(5));

        let resp = test::call_service(&app, ctx.get("/api/dashboard", &admin).to_request()).await;
        let body: Value = test::read_body_json(resp).await;
        let data = &body["data"];
        assert_eq!(data["stats"]["member_count"], 3);
        assert_eq!(data["stats"]["today_count"], 1);
        assert_eq!(data["stats"]["total_count"], 1);
        assert_eq!(data["stats"]["attendance_rate"], 33);
        assert_eq!(data["attendance"]["window"], "open");
        assert_eq!(data["today"].as_array().unwrap().len(), 1);
        assert_eq!(data["recent"][0]["time_ago"], "5 menit yang lalu");
        assert_eq!(data["recent"][0]["record"]["user_id"], siti.user.id.as_str());
    }

    #[actix_web::test]
    async fn dashboard_is_admin_only() {
        let ctx = TestContext::at("2024-01-01 09:00");
        let member = ctx.user("siti@foksi.id", Role::Member).await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let resp = test::call_service(&app, ctx.get("/api/dashboard", &member).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
