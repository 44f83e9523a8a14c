//! Ownership-based access control for member profiles.

use crate::db::{MemberProfile, User};
use crate::error::{ServiceError, ServiceResult};

/// Actions a user may attempt on member profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// List every profile
    ListAny,
    View,
    /// Create a profile for oneself (one per user, checked by the service)
    Create,
    Update,
    Delete,
    Restore,
    PermanentDelete,
}

impl Action {
    /// Whether the action is only allowed on one's own profile
    pub fn requires_ownership(&self) -> bool {
        matches!(
            self,
            Action::View | Action::Update | Action::Delete | Action::Restore
        )
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::ListAny => write!(f, "list"),
            Action::View => write!(f, "view"),
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
            Action::Restore => write!(f, "restore"),
            Action::PermanentDelete => write!(f, "permanently delete"),
        }
    }
}

/// Check whether `actor` may perform `action` on `target`
pub fn permits(actor: &User, action: Action, target: Option<&MemberProfile>) -> bool {
    match action {
        Action::PermanentDelete => false,
        action if action.requires_ownership() => {
            target.is_some_and(|profile| profile.user_id == actor.id)
        }
        _ => true,
    }
}

/// Like `permits`, but as a `Forbidden` error
pub fn authorize(
    actor: &User,
    action: Action,
    target: Option<&MemberProfile>,
) -> ServiceResult<()> {
    if permits(actor, action, target) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %actor.id,
            action = %action,
            member_id = target.map(|p| p.id),
            "Authorization denied"
        );
        Err(ServiceError::forbidden())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemberFields, MembershipStatus, MembershipType};
    use chrono::{NaiveDate, Utc};

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: "Test".to_string(),
            email: format!("{}@example.com", id),
            password_hash: String::new(),
            email_verified_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn profile(owner: &str) -> MemberProfile {
        MemberProfile {
            id: 1,
            user_id: owner.to_string(),
            fields: MemberFields {
                first_name: "Test".to_string(),
                last_name: "Owner".to_string(),
                phone: None,
                date_of_birth: None,
                gender: None,
                address: None,
                city: None,
                state: None,
                postal_code: None,
                membership_start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                membership_end_date: None,
                membership_status: MembershipStatus::Active,
                membership_type: MembershipType::Basic,
                emergency_contact_name: None,
                emergency_contact_phone: None,
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_owner_actions() {
        let owner = user("a");
        let target = profile("a");
        for action in [Action::View, Action::Update, Action::Delete, Action::Restore] {
            assert!(permits(&owner, action, Some(&target)), "{} denied", action);
        }
        assert!(!permits(&owner, Action::PermanentDelete, Some(&target)));
    }

    #[test]
    fn test_other_user_is_denied() {
        let other = user("b");
        let target = profile("a");
        for action in [Action::View, Action::Update, Action::Delete, Action::Restore] {
            assert!(!permits(&other, action, Some(&target)));
        }
        assert!(permits(&other, Action::ListAny, None));
        assert!(permits(&other, Action::Create, None));
    }

    #[test]
    fn test_ownership_action_without_target() {
        let actor = user("a");
        assert!(!permits(&actor, Action::View, None));
        assert!(Action::View.requires_ownership());
        assert!(!Action::ListAny.requires_ownership());
    }

    #[test]
    fn test_authorize_yields_forbidden() {
        let err = authorize(&user("b"), Action::Update, Some(&profile("a"))).unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert!(authorize(&user("a"), Action::Update, Some(&profile("a"))).is_ok());
    }
}
