use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

pub const DEFAULT_POSITION: &str = "Anggota";
pub const DEFAULT_REGION: &str = "-";
pub const DEFAULT_INSTITUTION: &str = "-";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "3f1c2a9e-8d57-4e0b-9a43-5b1c1d2e7f10",
    "name": "Siti Rahma",
    "email": "siti@foksi.id",
    "role": "anggota",
    "position": "Ketua Regional",
    "region": "Jawa Barat",
    "institution": "SMAN 1 Bandung",
    "phone": "081234567890",
    "created_at": "2024-01-01T08:00:00Z"
}))]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub position: String,
    pub region: String,
    pub institution: String,
    pub phone: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Case-insensitive match on name, email, position or region.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.name, &self.email, &self.position, &self.region]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

/// User row plus the stored password hash, as the credential layer needs it.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub position: String,
    pub region: String,
    pub institution: String,
    pub phone: String,
}

/// Profile fields an admin may change. Role and email stay fixed.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserPatch {
    #[schema(example = "Siti Rahmawati")]
    pub name: Option<String>,
    #[schema(example = "Sekretaris")]
    pub position: Option<String>,
    pub region: Option<String>,
    pub institution: Option<String>,
    pub phone: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }

    /// Column/value pairs for the fields that are set.
    pub fn assignments(&self) -> Vec<(&'static str, &str)> {
        [
            ("name", &self.name),
            ("position", &self.position),
            ("region", &self.region),
            ("institution", &self.institution),
            ("phone", &self.phone),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.as_deref().map(|v| (column, v)))
        .collect()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(v) = &self.name {
            user.name = v.clone();
        }
        if let Some(v) = &self.position {
            user.position = v.clone();
        }
        if let Some(v) = &self.region {
            user.region = v.clone();
        }
        if let Some(v) = &self.institution {
            user.institution = v.clone();
        }
        if let Some(v) = &self.phone {
            user.phone = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: "u1".into(),
            name: "Budi Santoso".into(),
            email: "budi@foksi.id".into(),
            role: Role::Member,
            position: "Bendahara".into(),
            region: "Jawa Timur".into(),
            institution: "SMAN 5 Surabaya".into(),
            phone: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn search_covers_name_email_position_region() {
        let user = sample();
        assert!(user.matches("budi"));
        assert!(user.matches("FOKSI.ID"));
        assert!(user.matches("bendahara"));
        assert!(user.matches("timur"));
        assert!(user.matches("  "));
        assert!(!user.matches("surabaya"));
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut user = sample();
        let patch = UserPatch {
            position: Some("Ketua".into()),
            phone: Some("0812".into()),
            ..Default::default()
        };
        assert_eq!(patch.assignments(), vec![("position", "Ketua"), ("phone", "0812")]);
        patch.apply(&mut user);
        assert_eq!(user.position, "Ketua");
        assert_eq!(user.phone, "0812");
        assert_eq!(user.name, "Budi Santoso");
        assert!(UserPatch::default().is_empty());
    }
}
