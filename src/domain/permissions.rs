//! Edit/delete rights over authored content.

use super::entities::User;

/// Whether `identity` may edit or delete content written by `author`.
///
/// Admins may moderate anything. Otherwise only the live author may, and a
/// tombstoned author or identity never matches.
pub fn can_moderate(identity: Option<&User>, author: &User) -> bool {
    let Some(User::Active(me)) = identity else {
        return false;
    };

    if me.is_admin() {
        return true;
    }

    match author {
        User::Active(target) => target.id == me.id,
        User::Deleted { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use agora_api_types::Role;

    use super::*;
    use crate::domain::entities::UserProfile;

    fn user(id: u64, role: Role) -> User {
        User::Active(UserProfile {
            id,
            username: format!("user{id}"),
            role,
            bio: None,
            avatar: None,
            post_count: None,
            comment_count: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        })
    }

    #[test]
    fn absent_identity_cannot_moderate() {
        assert!(!can_moderate(None, &user(1, Role::Member)));
    }

    #[test]
    fn author_can_moderate_own_content() {
        let me = user(1, Role::Member);
        assert!(can_moderate(Some(&me), &user(1, Role::Member)));
    }

    #[test]
    fn member_cannot_moderate_others() {
        let me = user(1, Role::Member);
        assert!(!can_moderate(Some(&me), &user(2, Role::Member)));
    }

    #[test]
    fn admin_can_moderate_anything() {
        let admin = user(1, Role::Admin);
        assert!(can_moderate(Some(&admin), &user(2, Role::Member)));
        assert!(can_moderate(Some(&admin), &User::Deleted { id: Some(2) }));
        assert!(can_moderate(Some(&admin), &User::Deleted { id: None }));
    }

    #[test]
    fn tombstoned_author_matches_nobody() {
        let me = user(3, Role::Member);
        assert!(!can_moderate(Some(&me), &User::Deleted { id: Some(3) }));
    }

    #[test]
    fn tombstoned_identity_matches_nobody() {
        let me = User::Deleted { id: Some(3) };
        assert!(!can_moderate(Some(&me), &user(3, Role::Member)));
    }

    #[test]
    fn decision_is_stable_across_calls() {
        let me = user(4, Role::Member);
        let target = user(4, Role::Member);
        let first = can_moderate(Some(&me), &target);
        assert_eq!(first, can_moderate(Some(&me), &target));
    }
}
