use sqlx::PgPool;
use uuid::Uuid;

use super::repo::{self, HouseholdMember, MemberRole};
use crate::error::{ApiError, ApiResult};

/// Active membership of `user_id` in `household_id`.
///
/// `404` when the household does not exist, `403` when the caller is not in it.
pub async fn require_member(db: &PgPool, household_id: Uuid, user_id: Uuid) -> ApiResult<HouseholdMember> {
    match repo::find_membership(db, household_id, user_id).await? {
        Some(m) if m.is_active => Ok(m),
        _ => {
            if repo::find_household(db, household_id).await?.is_none() {
                Err(ApiError::not_found("Household not found"))
            } else {
                Err(ApiError::forbidden("Not a member of this household"))
            }
        }
    }
}

pub async fn require_admin(db: &PgPool, household_id: Uuid, user_id: Uuid) -> ApiResult<HouseholdMember> {
    let member = require_member(db, household_id, user_id).await?;
    if !member.role.can_manage_members() {
        return Err(ApiError::forbidden("Admin role required"));
    }
    Ok(member)
}

pub async fn require_editor(db: &PgPool, household_id: Uuid, user_id: Uuid) -> ApiResult<HouseholdMember> {
    let member = require_member(db, household_id, user_id).await?;
    if !member.role.can_edit_tasks() {
        return Err(ApiError::forbidden("Viewers cannot change tasks"));
    }
    Ok(member)
}

/// Members may always remove themselves; removing anyone else takes an admin.
pub fn may_remove(caller: &HouseholdMember, member_id: Uuid) -> ApiResult<()> {
    if caller.user_id == member_id || caller.role.can_manage_members() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Admin role required"))
    }
}

/// Rejects removing the household's last active admin.
pub fn keeps_an_admin(removed: &HouseholdMember, active_admins: i64) -> ApiResult<()> {
    if removed.role == MemberRole::Admin && active_admins <= 1 {
        return Err(ApiError::conflict("A household needs at least one admin"));
    }
    Ok(())
}
