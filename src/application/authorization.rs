use crate::domain::ports::UserStoreBox;
use crate::error::{Error, Result};

/// Role/ownership checks in front of every state-mutating operation.
///
/// Payment creation is self-or-admin; the order-status toggle is
/// admin-only.
pub struct AuthorizationGate {
    users: UserStoreBox,
}

impl AuthorizationGate {
    pub fn new(users: UserStoreBox) -> Self {
        Self { users }
    }

    /// Allows the action when the acting user is an admin or owns the
    /// resource. Fails with `NotFound` when the acting user does not exist.
    pub async fn authorize(&self, acting: &str, resource_owner: &str) -> Result<()> {
        let user = self
            .users
            .get(acting)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {acting}")))?;

        if user.is_admin() || user.username == resource_owner {
            Ok(())
        } else {
            Err(Error::NotAuthorized(format!(
                "{acting} may not act on resources owned by {resource_owner}"
            )))
        }
    }

    /// Admin-only gate, used by the order-status toggle.
    pub async fn require_admin(&self, acting: &str) -> Result<()> {
        let user = self
            .users
            .get(acting)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {acting}")))?;

        if user.is_admin() {
            Ok(())
        } else {
            Err(Error::NotAuthorized(format!(
                "{acting} must be an admin for this operation"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{Role, User};
    use crate::infrastructure::in_memory::InMemoryStore;

    async fn gate() -> AuthorizationGate {
        let store = InMemoryStore::new();
        store.seed_user(User::new("root", Role::Admin)).await;
        store.seed_user(User::new("alice", Role::Customer)).await;
        store.seed_user(User::new("bob", Role::Customer)).await;
        AuthorizationGate::new(Box::new(store))
    }

    #[tokio::test]
    async fn test_admin_may_act_on_any_resource() {
        assert!(gate().await.authorize("root", "alice").await.is_ok());
    }

    #[tokio::test]
    async fn test_owner_may_act_on_own_resource() {
        assert!(gate().await.authorize("alice", "alice").await.is_ok());
    }

    #[tokio::test]
    async fn test_other_user_is_denied() {
        let result = gate().await.authorize("bob", "alice").await;
        assert!(matches!(result, Err(Error::NotAuthorized(_))));
    }

    #[tokio::test]
    async fn test_unknown_acting_user_is_not_found() {
        let result = gate().await.authorize("mallory", "alice").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_require_admin_rejects_non_admin() {
        let gate = gate().await;
        assert!(gate.require_admin("root").await.is_ok());
        assert!(matches!(
            gate.require_admin("alice").await,
            Err(Error::NotAuthorized(_))
        ));
    }
}
