use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::{clock_time::ClockTime, settings::AttendanceSettings},
    models::ApiResponse,
    rules::{
        clock::Clock,
        window::{WindowStatus, window_status},
    },
    store::Store,
};

#[derive(Deserialize, ToSchema)]
pub struct SaveSettings {
    #[schema(example = "Rapat Rutin FOKSI")]
    pub activity_name: String,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "08:00", value_type = String)]
    pub open_time: ClockTime,
    #[schema(example = "17:00", value_type = String)]
    pub close_time: ClockTime,
    pub active: bool,
}

#[derive(Serialize, ToSchema)]
pub struct SettingsView {
    pub settings: AttendanceSettings,
    pub window: WindowStatus,
    #[schema(example = "Absensi dibuka.", value_type = String)]
    pub message: &'static str,
}

impl SettingsView {
    pub fn new(settings: AttendanceSettings, clock: &dyn Clock) -> Self {
        let window = window_status(&settings, clock.now_local());
        SettingsView {
            settings,
            window,
            message: window.message(),
        }
    }
}

/// Current settings; an inactive default for today is saved on first read.
pub async fn load_or_init_settings(
    store: &dyn Store,
    clock: &dyn Clock,
) -> Result<AttendanceSettings, AppError> {
    if let Some(settings) = store.load_settings().await? {
        return Ok(settings);
    }

    let defaults = AttendanceSettings::default_for(clock.today(), clock.now_utc());
    store.save_settings(&defaults).await.map_err(|e| {
        error!(error = %e, "Failed to save default settings");
        AppError::Store(e)
    })?;
    info!("Default attendance settings created");
    Ok(defaults)
}

async fn persist(store: &dyn Store, settings: &AttendanceSettings) -> Result<(), AppError> {
    store.save_settings(settings).await.map_err(|e| {
        error!(error = %e, "Failed to save settings");
        AppError::Store(e)
    })
}

#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Attendance window settings and state", body = SettingsView),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn get_settings(
    _auth: AuthUser,
    store: web::Data<dyn Store>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, AppError> {
    let settings = load_or_init_settings(store.get_ref(), clock.get_ref()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(SettingsView::new(settings, clock.get_ref()))))
}

#[utoipa::path(
    put,
    path = "/api/settings",
    request_body = SaveSettings,
    responses(
        (status = 200, description = "Settings replaced", body = SettingsView),
        (status = 400, description = "Open time after close time"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn save_settings(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    clock: web::Data<dyn Clock>,
    payload: web::Json<SaveSettings>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    if payload.open_time > payload.close_time {
        return Err(AppError::validation(
            "Jam buka tidak boleh melewati jam tutup",
        ));
    }
    let activity_name = payload.activity_name.trim();
    if activity_name.is_empty() {
        return Err(AppError::validation("Nama kegiatan wajib diisi"));
    }

    let settings = AttendanceSettings {
        activity_name: activity_name.to_string(),
        date: payload.date,
        open_time: payload.open_time,
        close_time: payload.close_time,
        active: payload.active,
        updated_at: clock.now_utc(),
    };
    persist(store.get_ref(), &settings).await?;
    info!(admin = %auth.user_id, date = %settings.date, active = settings.active, "Attendance settings saved");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(SettingsView::new(settings, clock.get_ref()))))
}

/// Opens today's default window (08:00 to 17:00).
#[utoipa::path(
    post,
    path = "/api/settings/open",
    responses(
        (status = 200, description = "Attendance opened for today", body = SettingsView),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn open_today(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let settings = AttendanceSettings::opened_for(clock.today(), clock.now_utc());
    persist(store.get_ref(), &settings).await?;
    info!(admin = %auth.user_id, "Attendance opened");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(SettingsView::new(settings, clock.get_ref()))))
}

/// Keeps the current window but marks it inactive.
#[utoipa::path(
    post,
    path = "/api/settings/close",
    responses(
        (status = 200, description = "Attendance closed", body = SettingsView),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn close_attendance(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let current = load_or_init_settings(store.get_ref(), clock.get_ref()).await?;
    let settings = AttendanceSettings {
        active: false,
        updated_at: clock.now_utc(),
        ..current
    };
    persist(store.get_ref(), &settings).await?;
    info!(admin = %auth.user_id, "Attendance closed");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(SettingsView::new(settings, clock.get_ref()))))
}

#[cfg(test)]
mod tests {
    use crate::model::role::Role;
    use crate::store::Store;
    use crate::test_support::TestContext;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn first_read_creates_inactive_defaults() {
        let ctx = TestContext::at("2024-01-01 09:00");
        let member = ctx.user("m@foksi.id", Role::Member).await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let resp = test::call_service(&app, ctx.get("/api/settings", &member).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["settings"]["activity_name"], "Rapat Rutin FOKSI");
        assert_eq!(body["data"]["settings"]["date"], "2024-01-01");
        assert_eq!(body["data"]["settings"]["open_time"], "08:00");
        assert_eq!(body["data"]["settings"]["active"], false);
        assert_eq!(body["data"]["window"], "inactive");

        assert!(ctx.store.load_settings().await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn admin_saves_and_members_cannot() {
        let ctx = TestContext::at("2024-01-01 09:00");
        let admin = ctx.user("admin@foksi.id", Role::Admin).await;
        let member = ctx.user("m@foksi.id", Role::Member).await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let body = json!({
            "activity_name": "Rapat Akbar",
            "date": "2024-01-01",
            "open_time": "08:30",
            "close_time": "10:00",
            "active": true
        });

        let resp = test::call_service(
            &app,
            ctx.put("/api/settings", &member).set_json(&body).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(
            &app,
            ctx.put("/api/settings", &admin).set_json(&body).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["window"], "open");

        let saved = ctx.store.load_settings().await.unwrap().unwrap();
        assert_eq!(saved.activity_name, "Rapat Akbar");
        assert_eq!(saved.open_time.to_string(), "08:30");
    }

    #[actix_web::test]
    async fn rejects_inverted_and_malformed_windows() {
        let ctx = TestContext::at("2024-01-01 09:00");
        let admin = ctx.user("admin@foksi.id", Role::Admin).await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let inverted = json!({
            "activity_name": "Rapat",
            "date": "2024-01-01",
            "open_time": "17:00",
            "close_time": "08:00",
            "active": true
        });
        let resp = test::call_service(
            &app,
            ctx.put("/api/settings", &admin).set_json(&inverted).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let malformed = json!({
            "activity_name": "Rapat",
            "date": "2024-01-01",
            "open_time": "8:00",
            "close_time": "17:00",
            "active": true
        });
        let resp = test::call_service(
            &app,
            ctx.put("/api/settings", &admin).set_json(&malformed).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "invalid-argument");
        assert!(body["error"].as_str().unwrap().contains("8:00"));
    }

    #[actix_web::test]
    async fn quick_open_then_close() {
        let ctx = TestContext::at("2024-02-10 07:00");
        let admin = ctx.user("admin@foksi.id", Role::Admin).await;
        let app = test::init_service(App::new().configure(|cfg| ctx.configure(cfg))).await;

        let resp =
            test::call_service(&app, ctx.post("/api/settings/open", &admin).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["settings"]["date"], "2024-02-10");
        assert_eq!(body["data"]["settings"]["active"], true);
        assert_eq!(body["data"]["window"], "before_open");

        let resp =
            test::call_service(&app, ctx.post("/api/settings/close", &admin).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let saved = ctx.store.load_settings().await.unwrap().unwrap();
        assert!(!saved.active);
        assert_eq!(saved.date.to_string(), "2024-02-10");
    }
}
