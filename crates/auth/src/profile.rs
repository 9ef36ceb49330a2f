//! Per-kind profile extensions.
//!
//! Every identity owns exactly one extension and its variant always matches
//! the identity's [`AccountKind`]. Storage keeps one table per variant; this
//! module owns the shape conversions between the wire form and storage form
//! (notably contractor expertise, stored as one delimited string).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AccountKind;

/// Separator used when persisting contractor expertise.
pub const EXPERTISE_DELIMITER: char = ',';

const MIN_FOUNDING_YEAR: i32 = 1000;

/// Largest count a profile or posting may carry; storage columns are 32-bit signed.
pub const MAX_COUNT: u32 = i32::MAX as u32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("additionalInfo is required for {0} accounts")]
    MissingExtension(AccountKind),

    #[error("invalid additionalInfo: {0}")]
    Malformed(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0}")]
    OutOfRange(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionProfile {
    pub name: String,
    pub location: String,
    pub founding_year: i32,
    pub accreditation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgencyProfile {
    pub agency_name: String,
    pub license_number: String,
    pub specialization: String,
    pub years_experience: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractorProfile {
    #[serde(deserialize_with = "expertise_input")]
    pub expertise: Vec<String>,
    pub certification: String,
    pub available_hours: u32,
    pub hourly_rate: f64,
}

impl ContractorProfile {
    /// Storage form of `expertise`: `["Math", "Science"]` → `"Math,Science"`.
    pub fn expertise_column(&self) -> String {
        join_expertise(&self.expertise)
    }

    /// Rebuild the ordered sequence from its storage form.
    pub fn split_expertise(column: &str) -> Vec<String> {
        column
            .split(EXPERTISE_DELIMITER)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub fn join_expertise(items: &[String]) -> String {
    items.join(EXPERTISE_DELIMITER.to_string().as_str())
}

/// Accepts either a JSON array of strings or a single delimited string.
fn expertise_input<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::List(items) => items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Raw::Joined(s) => ContractorProfile::split_expertise(&s),
    })
}

/// Kind-specific profile extension (tagged union).
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    Institution(InstitutionProfile),
    Agency(AgencyProfile),
    Contractor(ContractorProfile),
}

impl Profile {
    pub fn kind(&self) -> AccountKind {
        match self {
            Self::Institution(_) => AccountKind::Institution,
            Self::Agency(_) => AccountKind::Agency,
            Self::Contractor(_) => AccountKind::Contractor,
        }
    }

    /// Parse the kind-shaped `additionalInfo` object for `kind`.
    pub fn from_fields(kind: AccountKind, fields: Option<&serde_json::Value>) -> Result<Self, ProfileError> {
        let fields = match fields {
            Some(v) if v.is_object() => v.clone(),
            Some(v) if v.is_null() => return Err(ProfileError::MissingExtension(kind)),
            None => return Err(ProfileError::MissingExtension(kind)),
            Some(_) => return Err(ProfileError::Malformed("expected an object".to_string())),
        };

        let parsed = match kind {
            AccountKind::Institution => serde_json::from_value(fields).map(Self::Institution),
            AccountKind::Agency => serde_json::from_value(fields).map(Self::Agency),
            AccountKind::Contractor => serde_json::from_value(fields).map(Self::Contractor),
        };
        parsed.map_err(|e| ProfileError::Malformed(e.to_string()))
    }

    /// Enforce presence and range constraints.
    pub fn validate(&self, current_year: i32) -> Result<(), ProfileError> {
        match self {
            Self::Institution(p) => {
                require("name", &p.name)?;
                require("location", &p.location)?;
                require("accreditation", &p.accreditation)?;
                if p.founding_year < MIN_FOUNDING_YEAR || p.founding_year > current_year {
                    return Err(ProfileError::OutOfRange(format!(
                        "foundingYear must be between {MIN_FOUNDING_YEAR} and {current_year}"
                    )));
                }
            }
            Self::Agency(p) => {
                require("agencyName", &p.agency_name)?;
                require("licenseNumber", &p.license_number)?;
                require("specialization", &p.specialization)?;
                at_most_max_count("yearsExperience", p.years_experience)?;
            }
            Self::Contractor(p) => {
                if p.expertise.is_empty() {
                    return Err(ProfileError::MissingField("expertise"));
                }
                if p.expertise.iter().any(|e| e.contains(EXPERTISE_DELIMITER)) {
                    return Err(ProfileError::OutOfRange(format!(
                        "expertise entries must not contain '{EXPERTISE_DELIMITER}'"
                    )));
                }
                require("certification", &p.certification)?;
                at_most_max_count("availableHours", p.available_hours)?;
                if !p.hourly_rate.is_finite() || p.hourly_rate < 0.0 {
                    return Err(ProfileError::OutOfRange(
                        "hourlyRate must be a non-negative number".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// JSON view of the extension (camelCase fields, expertise as a list).
    pub fn to_json(&self) -> serde_json::Value {
        let value = match self {
            Self::Institution(p) => serde_json::to_value(p),
            Self::Agency(p) => serde_json::to_value(p),
            Self::Contractor(p) => serde_json::to_value(p),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ProfileError> {
    if value.trim().is_empty() {
        Err(ProfileError::MissingField(field))
    } else {
        Ok(())
    }
}

fn at_most_max_count(field: &str, value: u32) -> Result<(), ProfileError> {
    if value > MAX_COUNT {
        Err(ProfileError::OutOfRange(format!("{field} must be at most {MAX_COUNT}")))
    } else {
        Ok(())
    }
}
