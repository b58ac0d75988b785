//! crates/wordsprout_core/src/session.rs
//!
//! The session repository: a thin typed layer over the key-value
//! [`SessionStore`] that owns serialization of principals and the full set of
//! storage keys. Call sites never spell out a raw key string.

use crate::domain::{Principal, Role};
use crate::ports::{PortError, PortResult, SessionStore};
use std::sync::Arc;

/// Every storage key the application uses. Logout must clear all of the
/// role-scoped keys, not just the active role's, to avoid stale cross-role
/// leakage.
pub mod keys {
    pub const CURRENT_STUDENT: &str = "current_student";
    pub const CURRENT_ADMIN: &str = "current_admin";
    pub const CURRENT_TEACHER: &str = "current_teacher";
    pub const CURRENT_PARENT: &str = "current_parent";
    pub const STUDENT_PIN: &str = "student_pin";
    pub const IS_GUEST: &str = "is_guest";

    /// The keys cleared on logout.
    pub const ALL: [&str; 6] = [
        CURRENT_STUDENT,
        CURRENT_ADMIN,
        CURRENT_TEACHER,
        CURRENT_PARENT,
        STUDENT_PIN,
        IS_GUEST,
    ];
}

/// Maps a role to the storage key its principal is mirrored under.
/// Guests share the student key; the `is_guest` flag tells them apart.
fn key_for_role(role: Role) -> &'static str {
    match role {
        Role::Admin => keys::CURRENT_ADMIN,
        Role::Teacher => keys::CURRENT_TEACHER,
        Role::Parent => keys::CURRENT_PARENT,
        Role::Student | Role::Guest => keys::CURRENT_STUDENT,
    }
}

/// Owns reading and writing principals in the session store. The store is the
/// sole source of truth for student identity across page reloads.
#[derive(Clone)]
pub struct SessionRepository {
    store: Arc<dyn SessionStore>,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Mirrors a freshly resolved principal into storage under its role key.
    /// Registered students also get their PIN stashed for convenience login;
    /// guests get the `is_guest` flag so downstream features can tell the
    /// ephemeral identity from a persistent one.
    pub async fn persist(&self, principal: &Principal) -> PortResult<()> {
        let json = serde_json::to_string(principal)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(key_for_role(principal.role()), json).await?;

        match principal {
            Principal::Student(profile) => {
                self.store
                    .set(keys::STUDENT_PIN, profile.pin_code.clone())
                    .await?;
                self.store.remove(keys::IS_GUEST).await?;
            }
            Principal::Guest(_) => {
                self.store.set(keys::IS_GUEST, "true".to_string()).await?;
                self.store.remove(keys::STUDENT_PIN).await?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Reads back the persisted student identity, if any. A blob that fails
    /// to deserialize is treated as absent rather than an error, so a corrupt
    /// entry cannot lock a student out.
    pub async fn load_student(&self) -> PortResult<Option<Principal>> {
        let Some(json) = self.store.get(keys::CURRENT_STUDENT).await? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&json).ok())
    }

    /// Reads back a persisted staff principal for the given role.
    pub async fn load_role(&self, role: Role) -> PortResult<Option<Principal>> {
        let Some(json) = self.store.get(key_for_role(role)).await? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&json).ok())
    }

    /// Whether the persisted student identity is flagged as a guest.
    pub async fn is_guest(&self) -> PortResult<bool> {
        Ok(self
            .store
            .get(keys::IS_GUEST)
            .await?
            .is_some_and(|v| v == "true"))
    }

    /// Clears every session key. Enumerates the full key set so no role's
    /// stale identity survives a logout.
    pub async fn clear(&self) -> PortResult<()> {
        for key in keys::ALL {
            self.store.remove(key).await?;
        }
        Ok(())
    }
}
