use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account category, fixed for the lifetime of an identity.
///
/// Determines which profile extension exists and which gated operations are
/// reachable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    Institution,
    Agency,
    Contractor,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown account kind '{0}' (expected INSTITUTION, AGENCY or CONTRACTOR)")]
pub struct UnknownKind(pub String);

impl AccountKind {
    pub const ALL: [AccountKind; 3] = [Self::Institution, Self::Agency, Self::Contractor];

    /// Wire/storage representation (`"INSTITUTION"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Institution => "INSTITUTION",
            Self::Agency => "AGENCY",
            Self::Contractor => "CONTRACTOR",
        }
    }

    /// Lowercase key used to nest the profile in login responses.
    pub fn profile_key(&self) -> &'static str {
        match self {
            Self::Institution => "institution",
            Self::Agency => "agency",
            Self::Contractor => "contractor",
        }
    }
}

impl FromStr for AccountKind {
    type Err = UnknownKind;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

impl core::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_any_case() {
        assert_eq!("AGENCY".parse::<AccountKind>().unwrap(), AccountKind::Agency);
        assert_eq!(" contractor ".parse::<AccountKind>().unwrap(), AccountKind::Contractor);
        assert_eq!("Institution".parse::<AccountKind>().unwrap(), AccountKind::Institution);
    }

    #[test]
    fn rejects_unknown() {
        assert!("ADMIN".parse::<AccountKind>().is_err());
        assert!("".parse::<AccountKind>().is_err());
    }

    #[test]
    fn serializes_as_upper_case() {
        let json = serde_json::to_string(&AccountKind::Contractor).unwrap();
        assert_eq!(json, "\"CONTRACTOR\"");
    }
}
