use crate::api::attendance::{MemberAttendanceStatus, SubmitAttendance};
use crate::api::dashboard::{Dashboard, RecentActivity};
use crate::api::members::MemberDetail;
use crate::api::reports::AttendanceReport;
use crate::api::settings::{SaveSettings, SettingsView};
use crate::model::attendance::{AttendanceFilter, AttendanceRecord, AttendanceStatus};
use crate::model::role::Role;
use crate::model::settings::AttendanceSettings;
use crate::model::user::{User, UserPatch};
use crate::models::{LoginReqDto, LoginResponse, RefreshReq, RegisterReq};
use crate::rules::stats::{AttendanceStats, StatusBreakdown};
use crate::rules::window::WindowStatus;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FOKSI Absensi API",
        version = "1.0.0",
        description = r#"
## FOKSI attendance service

Members submit one attendance record per day while the admin keeps the
attendance window open. Admins manage members, the window and see the
dashboard.

### 🔹 Key Features
- **Attendance**
  - Window status, daily submission (H / I / S / A), own history
  - Admin list with filters and CSV export
- **Settings**
  - Activity name, date, open and close time, quick open / close
- **Members**
  - List with search, detail, add, edit and delete
- **Dashboard**
  - Member count, today's count, total count, attendance rate, recent activity
- **Reports**
  - H / I / S / A rates over a date range

### 🔐 Security
Every endpoint under `/api` needs a **JWT Bearer** access token.
Obtain one with `POST /auth/login`, renew it with `POST /auth/refresh`.

### 📦 Response Format
- Success: `{"success": true, "data": ...}`
- Failure: `{"success": false, "error": "...", "code": "..."}`
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::me,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::settings::get_settings,
        crate::api::settings::save_settings,
        crate::api::settings::open_today,
        crate::api::settings::close_attendance,

        crate::api::attendance::attendance_status,
        crate::api::attendance::submit_attendance,
        crate::api::attendance::my_attendances,
        crate::api::attendance::list_attendances,
        crate::api::attendance::export_attendances,

        crate::api::members::list_members,
        crate::api::members::get_member,
        crate::api::members::create_member,
        crate::api::members::update_member,
        crate::api::members::delete_member,

        crate::api::dashboard::dashboard,

        crate::api::reports::attendance_report
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            LoginResponse,
            RefreshReq,
            Role,
            User,
            UserPatch,
            MemberDetail,
            AttendanceStatus,
            AttendanceRecord,
            AttendanceFilter,
            SubmitAttendance,
            MemberAttendanceStatus,
            AttendanceSettings,
            SaveSettings,
            SettingsView,
            WindowStatus,
            AttendanceStats,
            RecentActivity,
            Dashboard,
            StatusBreakdown,
            AttendanceReport
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Sign-in, registration and sessions"),
        (name = "Attendance", description = "Daily attendance submission and reports"),
        (name = "Settings", description = "Attendance window settings"),
        (name = "Members", description = "Member management APIs"),
        (name = "Dashboard", description = "Admin dashboard"),
        (name = "Reports", description = "Attendance reports per period"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
