use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
pub enum Role {
    #[serde(rename = "admin")]
    #[strum(serialize = "admin")]
    Admin,
    #[serde(rename = "anggota")]
    #[strum(serialize = "anggota")]
    Member,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn wire_names_match_stored_values() {
        assert_eq!(Role::Member.as_ref(), "anggota");
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::from_str("anggota").unwrap(), Role::Member);
        assert!(Role::from_str("hr").is_err());
        assert_eq!(serde_json::to_string(&Role::Member).unwrap(), "\"anggota\"");
    }
}
