//! Document store boundary: users, attendance records, the settings
//! singleton and refresh tokens.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;

use crate::model::{
    attendance::{AttendanceFilter, AttendanceRecord, NewAttendance},
    role::Role,
    settings::AttendanceSettings,
    user::{Credentials, NewUser, User, UserPatch},
};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Display)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[display(fmt = "already exists")]
    AlreadyExists,
    #[display(fmt = "not found")]
    NotFound,
    #[display(fmt = "corrupt record: {}", _0)]
    Corrupt(String),
    #[display(fmt = "backend error: {}", _0)]
    Backend(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000") => {
                StoreError::AlreadyExists
            }
            sqlx::Error::RowNotFound => StoreError::NotFound,
            _ => StoreError::Backend(e.to_string()),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with `AlreadyExists` when the email is taken.
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, StoreError>;

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, StoreError>;

    /// Returns `false` when no user has this id.
    async fn update_user(&self, id: &str, patch: &UserPatch) -> Result<bool, StoreError>;

    async fn delete_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn count_users(&self, role: Option<Role>) -> Result<u64, StoreError>;

    /// Fails with `AlreadyExists` when the member already has a record for
    /// that date.
    async fn insert_attendance(&self, new: NewAttendance)
    -> Result<AttendanceRecord, StoreError>;

    async fn has_attendance(&self, user_id: &str, date: NaiveDate) -> Result<bool, StoreError>;

    /// Newest first.
    async fn list_attendances(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    async fn count_attendances(&self, date: Option<NaiveDate>) -> Result<u64, StoreError>;

    async fn load_settings(&self) -> Result<Option<AttendanceSettings>, StoreError>;

    async fn save_settings(&self, settings: &AttendanceSettings) -> Result<(), StoreError>;

    async fn store_refresh_token(
        &self,
        user_id: &str,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Marks the token revoked. Returns the owning user id if the token was
    /// live before the call.
    async fn revoke_refresh_token(&self, jti: &str) -> Result<Option<String>, StoreError>;
}
