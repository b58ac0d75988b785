//! services/api/src/adapters/auth_provider.rs
//!
//! The hosted-auth-provider adapter for staff logins. Implements the
//! `AuthProvider` port against the staff tables: argon2 password
//! verification plus server-side cookie sessions with a 30-day expiry.

use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use wordsprout_core::domain::{Principal, StaffProfile};
use wordsprout_core::ports::{AuthProvider, PortError, PortResult};

/// How long a staff session stays valid.
const SESSION_TTL_DAYS: i64 = 30;

/// An adapter that implements the `AuthProvider` port using the staff
/// credential and session tables.
#[derive(Clone)]
pub struct DbAuthAdapter {
    pool: PgPool,
}

impl DbAuthAdapter {
    /// Creates a new `DbAuthAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct StaffRecord {
    user_id: Uuid,
    display_name: String,
    email: String,
    role: String,
    hashed_password: String,
}

impl StaffRecord {
    fn to_principal(&self) -> PortResult<Principal> {
        let profile = StaffProfile {
            id: self.user_id,
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        };
        match self.role.as_str() {
            "admin" => Ok(Principal::Admin(profile)),
            "teacher" => Ok(Principal::Teacher(profile)),
            "parent" => Ok(Principal::Parent(profile)),
            other => Err(PortError::Unexpected(format!(
                "Unknown staff role '{}' for {}",
                other, self.email
            ))),
        }
    }
}

#[async_trait]
impl AuthProvider for DbAuthAdapter {
    async fn login(&self, email: &str, password: &str) -> PortResult<(Principal, String)> {
        // 1. Get the staff record by email. A miss reports Unauthorized, not
        //    NotFound, so callers cannot tell which half of the pair failed.
        let record = sqlx::query_as::<_, StaffRecord>(
            "SELECT user_id, display_name, email, role, hashed_password \
             FROM staff_profiles WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => PortError::Unexpected(e.to_string()),
        })?;

        // 2. Verify the password against the stored argon2 hash.
        let parsed_hash = PasswordHash::new(&record.hashed_password)
            .map_err(|e| PortError::Unexpected(format!("Stored hash is invalid: {}", e)))?;
        let valid = Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok();
        if !valid {
            return Err(PortError::Unauthorized);
        }

        // 3. Open a server-side session.
        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&token)
            .bind(record.user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok((record.to_principal()?, token))
    }

    async fn current_user(&self, token: &str) -> PortResult<Option<Principal>> {
        let record = sqlx::query_as::<_, StaffRecord>(
            "SELECT p.user_id, p.display_name, p.email, p.role, p.hashed_password \
             FROM auth_sessions s JOIN staff_profiles p ON p.user_id = s.user_id \
             WHERE s.id = $1 AND s.expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        record.map(|r| r.to_principal()).transpose()
    }

    async fn logout(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
