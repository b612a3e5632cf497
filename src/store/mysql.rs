use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};
use uuid::Uuid;

use crate::model::{
    attendance::{AttendanceFilter, AttendanceRecord, NewAttendance},
    role::Role,
    settings::{AttendanceSettings, SETTINGS_KEY},
    user::{Credentials, NewUser, User, UserPatch},
};
use crate::store::{Store, StoreError};
use crate::utils::db_utils::{SqlValue, build_attendance_where, build_update_sql};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, position, region, institution, phone, created_at";

const ATTENDANCE_COLUMNS: &str = "id, user_id, name, position, region, institution, status, note, \
     date, submitted_at, created_at";

#[derive(FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    position: String,
    region: String,
    institution: String,
    phone: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for Credentials {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|_| StoreError::Corrupt(format!("user {} has role '{}'", row.id, row.role)))?;
        Ok(Credentials {
            user: User {
                id: row.id,
                name: row.name,
                email: row.email,
                role,
                position: row.position,
                region: row.region,
                institution: row.institution,
                phone: row.phone,
                created_at: row.created_at,
            },
            password_hash: row.password_hash,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: String,
    user_id: String,
    name: String,
    position: String,
    region: String,
    institution: String,
    status: String,
    note: String,
    date: NaiveDate,
    submitted_at: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|_| {
            StoreError::Corrupt(format!("attendance {} has status '{}'", row.id, row.status))
        })?;
        let submitted_at = row
            .submitted_at
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("attendance {}: {}", row.id, e)))?;
        Ok(AttendanceRecord {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            position: row.position,
            region: row.region,
            institution: row.institution,
            status,
            note: row.note,
            date: row.date,
            submitted_at,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct SettingsRow {
    activity_name: String,
    date: NaiveDate,
    open_time: String,
    close_time: String,
    is_active: bool,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SettingsRow> for AttendanceSettings {
    type Error = StoreError;

    fn try_from(row: SettingsRow) -> Result<Self, Self::Error> {
        let corrupt = |e: crate::model::clock_time::ParseClockTimeError| {
            StoreError::Corrupt(format!("settings: {}", e))
        };
        Ok(AttendanceSettings {
            activity_name: row.activity_name,
            date: row.date,
            open_time: row.open_time.parse().map_err(corrupt)?,
            close_time: row.close_time.parse().map_err(corrupt)?,
            active: row.is_active,
            updated_at: row.updated_at,
        })
    }
}

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_user_where(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<Credentials>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .map(Credentials::try_from)
            .transpose()
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let email = new.email.to_lowercase();

        sqlx::query(
            r#"
            INSERT INTO users
                (id, name, email, password_hash, role, position, region, institution, phone, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.name)
        .bind(&email)
        .bind(&new.password_hash)
        .bind(new.role.as_ref())
        .bind(&new.position)
        .bind(&new.region)
        .bind(&new.institution)
        .bind(&new.phone)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id,
            name: new.name,
            email,
            role: new.role,
            position: new.position,
            region: new.region,
            institution: new.institution,
            phone: new.phone,
            created_at,
        })
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.fetch_user_where("id", id).await?.map(|c| c.user))
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, StoreError> {
        self.fetch_user_where("email", &email.to_lowercase()).await
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, StoreError> {
        let rows = match role {
            Some(role) => {
                let sql = format!(
                    "SELECT {} FROM users WHERE role = ? ORDER BY created_at, name",
                    USER_COLUMNS
                );
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(role.as_ref())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {} FROM users ORDER BY created_at, name", USER_COLUMNS);
                sqlx::query_as::<_, UserRow>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter()
            .map(|row| Credentials::try_from(row).map(|c| c.user))
            .collect()
    }

    async fn update_user(&self, id: &str, patch: &UserPatch) -> Result<bool, StoreError> {
        let Some(update) = build_update_sql("users", &patch.assignments(), "id", id) else {
            return Ok(self.get_user(id).await?.is_some());
        };

        let mut query = sqlx::query(&update.sql);
        for value in update.values {
            query = match value {
                SqlValue::String(v) => query.bind(v),
                SqlValue::Date(v) => query.bind(v),
            };
        }
        let result = query.execute(&self.pool).await?;

        // MySQL reports 0 affected rows when the values did not change.
        if result.rows_affected() == 0 {
            return Ok(self.get_user(id).await?.is_some());
        }
        Ok(true)
    }

    async fn delete_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let Some(user) = self.get_user(id).await? else {
            return Ok(None);
        };

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok((result.rows_affected() > 0).then_some(user))
    }

    async fn count_users(&self, role: Option<Role>) -> Result<u64, StoreError> {
        let total = match role {
            Some(role) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = ?")
                    .bind(role.as_ref())
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(total.max(0) as u64)
    }

    async fn insert_attendance(
        &self,
        new: NewAttendance,
    ) -> Result<AttendanceRecord, StoreError> {
        let id = Uuid::new_v4().to_string();
        let created_at = new.created_at;

        // uq_attendance_user_date turns a racing duplicate into AlreadyExists.
        sqlx::query(
            r#"
            INSERT INTO attendances
                (id, user_id, name, position, region, institution, status, note, date, submitted_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.user_id)
        .bind(&new.name)
        .bind(&new.position)
        .bind(&new.region)
        .bind(&new.institution)
        .bind(new.status.as_ref())
        .bind(&new.note)
        .bind(new.date)
        .bind(new.submitted_at.to_string())
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(AttendanceRecord {
            id,
            user_id: new.user_id,
            name: new.name,
            position: new.position,
            region: new.region,
            institution: new.institution,
            status: new.status,
            note: new.note,
            date: new.date,
            submitted_at: new.submitted_at,
            created_at,
        })
    }

    async fn has_attendance(&self, user_id: &str, date: NaiveDate) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM attendances WHERE user_id = ? AND date = ? LIMIT 1)",
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    async fn list_attendances(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let clause = build_attendance_where(filter);
        let sql = format!(
            "SELECT {} FROM attendances{} ORDER BY created_at DESC",
            ATTENDANCE_COLUMNS, clause.sql
        );

        let mut query = sqlx::query_as::<_, AttendanceRow>(&sql);
        for value in clause.values {
            query = match value {
                SqlValue::String(v) => query.bind(v),
                SqlValue::Date(v) => query.bind(v),
            };
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(AttendanceRecord::try_from)
            .collect()
    }

    async fn count_attendances(&self, date: Option<NaiveDate>) -> Result<u64, StoreError> {
        let total = match date {
            Some(date) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendances WHERE date = ?")
                    .bind(date)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendances")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(total.max(0) as u64)
    }

    async fn load_settings(&self) -> Result<Option<AttendanceSettings>, StoreError> {
        sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT activity_name, date, open_time, close_time, is_active, updated_at
            FROM settings
            WHERE id = ?
            "#,
        )
        .bind(SETTINGS_KEY)
        .fetch_optional(&self.pool)
        .await?
        .map(AttendanceSettings::try_from)
        .transpose()
    }

    async fn save_settings(&self, settings: &AttendanceSettings) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            REPLACE INTO settings
                (id, activity_name, date, open_time, close_time, is_active, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(SETTINGS_KEY)
        .bind(&settings.activity_name)
        .bind(settings.date)
        .bind(settings.open_time.to_string())
        .bind(settings.close_time.to_string())
        .bind(settings.active)
        .bind(settings.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn store_refresh_token(
        &self,
        user_id: &str,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, jti, expires_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> Result<Option<String>, StoreError> {
        let record = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT user_id
            FROM refresh_tokens
            WHERE jti = ? AND revoked = FALSE AND expires_at > UTC_TIMESTAMP()
            "#,
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?;

        let result =
            sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ? AND revoked = FALSE")
                .bind(jti)
                .execute(&self.pool)
                .await?;

        // A concurrent revoke may have won between the two statements.
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(record.map(|(user_id,)| user_id))
    }
}
