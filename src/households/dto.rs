use serde::{Deserialize, Serialize};

use super::repo::{Household, MemberProfile, MemberRole};
use crate::error::ApiError;
use crate::patch::{double_option, trimmed};
use crate::tasks::repo::Task;

#[derive(Debug, Deserialize)]
pub struct CreateHouseholdRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

/// Validated input for a new household.
#[derive(Debug, PartialEq, Eq)]
pub struct NewHousehold {
    pub name: String,
    pub description: Option<String>,
}

impl CreateHouseholdRequest {
    pub fn validate(self) -> Result<NewHousehold, ApiError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ApiError::bad_request("Household name is required"));
        }
        Ok(NewHousehold {
            name: name.to_string(),
            description: trimmed(self.description),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateHouseholdRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// Validated household edit. `None` fields stay unchanged.
#[derive(Debug, PartialEq, Eq)]
pub struct HouseholdChanges {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

impl UpdateHouseholdRequest {
    /// A present name must not be blank. A blank or `null` description clears it.
    pub fn validate(self) -> Result<HouseholdChanges, ApiError> {
        let name = match self.name {
            Some(n) if n.trim().is_empty() => {
                return Err(ApiError::bad_request("Household name cannot be empty"))
            }
            Some(n) => Some(n.trim().to_string()),
            None => None,
        };
        Ok(HouseholdChanges {
            name,
            description: self.description.map(trimmed),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub email: String,
    pub role: Option<MemberRole>,
}

/// One entry of the caller's household list.
#[derive(Debug, Clone, Serialize)]
pub struct HouseholdSummary {
    #[serde(flatten)]
    pub household: Household,
    pub role: MemberRole,
    pub member_count: i64,
    pub open_task_count: i64,
}

#[derive(Debug, Serialize)]
pub struct HouseholdDetail {
    #[serde(flatten)]
    pub household: Household,
    pub members: Vec<MemberProfile>,
    pub tasks: Vec<Task>,
}
