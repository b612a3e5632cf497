use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::model::{
    attendance::{AttendanceFilter, AttendanceRecord, NewAttendance},
    role::Role,
    settings::AttendanceSettings,
    user::{Credentials, NewUser, User, UserPatch},
};
use crate::store::{Store, StoreError};

struct RefreshEntry {
    user_id: String,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

#[derive(Default)]
struct Inner {
    users: HashMap<String, Credentials>,
    attendances: Vec<AttendanceRecord>,
    settings: Option<AttendanceSettings>,
    refresh_tokens: HashMap<String, RefreshEntry>,
}

/// Process-local store. Check-and-insert happens under one write lock, so
/// the one-record-per-day rule holds even under concurrent submissions.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|e| StoreError::Backend(format!("memory store poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|e| StoreError::Backend(format!("memory store poisoned: {}", e)))
    }
}

fn newest_first(records: &mut [AttendanceRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut inner = self.write()?;
        let email = new.email.to_lowercase();
        if inner.users.values().any(|c| c.user.email == email) {
            return Err(StoreError::AlreadyExists);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            email,
            role: new.role,
            position: new.position,
            region: new.region,
            institution: new.institution,
            phone: new.phone,
            created_at: Utc::now(),
        };
        inner.users.insert(
            user.id.clone(),
            Credentials {
                user: user.clone(),
                password_hash: new.password_hash,
            },
        );
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(id).map(|c| c.user.clone()))
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, StoreError> {
        let email = email.to_lowercase();
        Ok(self
            .read()?
            .users
            .values()
            .find(|c| c.user.email == email)
            .cloned())
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self
            .read()?
            .users
            .values()
            .filter(|c| role.is_none_or(|r| c.user.role == r))
            .map(|c| c.user.clone())
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(users)
    }

    async fn update_user(&self, id: &str, patch: &UserPatch) -> Result<bool, StoreError> {
        let mut inner = self.write()?;
        match inner.users.get_mut(id) {
            Some(c) => {
                patch.apply(&mut c.user);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.write()?.users.remove(id).map(|c| c.user))
    }

    async fn count_users(&self, role: Option<Role>) -> Result<u64, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .filter(|c| role.is_none_or(|r| c.user.role == r))
            .count() as u64)
    }

    async fn insert_attendance(
        &self,
        new: NewAttendance,
    ) -> Result<AttendanceRecord, StoreError> {
        let mut inner = self.write()?;
        if inner
            .attendances
            .iter()
            .any(|r| r.user_id == new.user_id && r.date == new.date)
        {
            return Err(StoreError::AlreadyExists);
        }

        let record = AttendanceRecord {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            name: new.name,
            position: new.position,
            region: new.region,
            institution: new.institution,
            status: new.status,
            note: new.note,
            date: new.date,
            submitted_at: new.submitted_at,
            created_at: new.created_at,
        };
        inner.attendances.push(record.clone());
        Ok(record)
    }

    async fn has_attendance(&self, user_id: &str, date: NaiveDate) -> Result<bool, StoreError> {
        Ok(self
            .read()?
            .attendances
            .iter()
            .any(|r| r.user_id == user_id && r.date == date))
    }

    async fn list_attendances(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut records: Vec<AttendanceRecord> = self
            .read()?
            .attendances
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        newest_first(&mut records);
        Ok(records)
    }

    async fn count_attendances(&self, date: Option<NaiveDate>) -> Result<u64, StoreError> {
        Ok(self
            .read()?
            .attendances
            .iter()
            .filter(|r| date.is_none_or(|d| r.date == d))
            .count() as u64)
    }

    async fn load_settings(&self) -> Result<Option<AttendanceSettings>, StoreError> {
        Ok(self.read()?.settings.clone())
    }

    async fn save_settings(&self, settings: &AttendanceSettings) -> Result<(), StoreError> {
        self.write()?.settings = Some(settings.clone());
        Ok(())
    }

    async fn store_refresh_token(
        &self,
        user_id: &str,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        // Dead entries can never be revoked again.
        let now = Utc::now();
        inner
            .refresh_tokens
            .retain(|_, entry| !entry.revoked && entry.expires_at > now);

        if inner.refresh_tokens.contains_key(jti) {
            return Err(StoreError::AlreadyExists);
        }
        inner.refresh_tokens.insert(
            jti.to_string(),
            RefreshEntry {
                user_id: user_id.to_string(),
                expires_at,
                revoked: false,
            },
        );
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> Result<Option<String>, StoreError> {
        let mut inner = self.write()?;
        let now = Utc::now();
        Ok(match inner.refresh_tokens.get_mut(jti) {
            Some(entry) if !entry.revoked && entry.expires_at > now => {
                entry.revoked = true;
                Some(entry.user_id.clone())
            }
            Some(entry) => {
                entry.revoked = true;
                None
            }
            None => None,
        })
    }
}
