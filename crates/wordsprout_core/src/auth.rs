//! crates/wordsprout_core/src/auth.rs
//!
//! The unified auth resolver: the single entry point that determines, from a
//! persisted session or interactive credentials, which role the current user
//! holds and where to send them. Staff roles go through the hosted auth
//! provider; students resolve against the content store and live entirely in
//! the session store.

use crate::domain::{GuestProfile, Principal, Role, StaffProfile, StudentProfile};
use crate::ports::{AuthProvider, ContentStore, PortError, PortResult, SessionStore};
use crate::session::SessionRepository;
use std::sync::Arc;
use uuid::Uuid;

/// The neutral route logout lands on, and the routes `check_auth` treats as
/// "currently on a login screen" when deciding whether to redirect.
pub const LOGIN_ROUTE: &str = "/login";

const LOGIN_ROUTES: [&str; 2] = ["/", LOGIN_ROUTE];

//=========================================================================================
// Results and Failures
//=========================================================================================

/// A successful login: the resolved principal, the staff session token when
/// the auth provider issued one, and the dashboard route to land on.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub principal: Principal,
    pub token: Option<String>,
    pub redirect_to: &'static str,
}

/// A reported, non-fatal login failure. Collaborator errors are normalized
/// here and never propagate as raw errors to the caller.
#[derive(Debug, thiserror::Error)]
pub enum LoginFailure {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid pin")]
    InvalidPin,
    #[error("auth collaborator unavailable: {0}")]
    Unavailable(String),
}

impl LoginFailure {
    /// The short localized message shown to the user. Retry is always
    /// immediate; nothing here is fatal.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Email hoặc mật khẩu không đúng",
            Self::InvalidPin => "Mã PIN không đúng",
            Self::Unavailable(_) => "Có lỗi xảy ra, vui lòng thử lại",
        }
    }
}

/// What `check_auth` resolved on mount: the active principal, if any, and a
/// redirect when the user is sitting on a login route with a valid identity.
#[derive(Debug, Clone)]
pub struct AuthSnapshot {
    pub principal: Option<Principal>,
    pub redirect_to: Option<&'static str>,
}

//=========================================================================================
// AuthResolver
//=========================================================================================

/// Resolves and owns the active principal for a session.
///
/// State machine: Unauthenticated --(any successful login)--> Authenticated
/// --(logout)--> Unauthenticated. The role is immutable for the lifetime of
/// a session; switching roles always goes through logout.
#[derive(Clone)]
pub struct AuthResolver {
    auth: Arc<dyn AuthProvider>,
    content: Arc<dyn ContentStore>,
    sessions: SessionRepository,
}

impl AuthResolver {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        content: Arc<dyn ContentStore>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            auth,
            content,
            sessions: SessionRepository::new(store),
        }
    }

    pub fn sessions(&self) -> &SessionRepository {
        &self.sessions
    }

    /// Resolves the current identity without prompting for credentials.
    ///
    /// Queries the auth provider for a server-validated staff session first,
    /// then falls back to the locally persisted student record. Repeated
    /// calls converge on the same identity; a provider miss never clears an
    /// already-persisted student. The redirect is only offered when the user
    /// is currently on a login route.
    pub async fn check_auth(
        &self,
        staff_token: Option<&str>,
        current_path: &str,
    ) -> PortResult<AuthSnapshot> {
        let mut principal = None;
        if let Some(token) = staff_token {
            principal = self.auth.current_user(token).await?;
        }
        if principal.is_none() {
            principal = self.sessions.load_student().await?;
        }

        let redirect_to = principal
            .as_ref()
            .filter(|_| LOGIN_ROUTES.contains(&current_path))
            .map(|p| p.dashboard_route());

        Ok(AuthSnapshot {
            principal,
            redirect_to,
        })
    }

    /// Email/password login for the staff roles. Field presence is validated
    /// by the caller; this only delegates and normalizes the outcome.
    pub async fn login_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginSuccess, LoginFailure> {
        let (principal, token) = match self.auth.login(email, password).await {
            Ok(ok) => ok,
            Err(PortError::Unauthorized) | Err(PortError::NotFound(_)) => {
                return Err(LoginFailure::InvalidCredentials)
            }
            Err(e) => return Err(LoginFailure::Unavailable(e.to_string())),
        };

        self.persist_or_unavailable(&principal).await?;
        Ok(LoginSuccess {
            redirect_to: principal.dashboard_route(),
            principal,
            token: Some(token),
        })
    }

    /// Exact-match lookup of a 4-digit PIN. Fails closed: no match means no
    /// partial authentication of any kind.
    pub async fn login_with_pin(&self, pin: &str) -> Result<LoginSuccess, LoginFailure> {
        let student = match self.content.find_student_by_pin(pin).await {
            Ok(student) => student,
            Err(PortError::NotFound(_)) => return Err(LoginFailure::InvalidPin),
            Err(e) => return Err(LoginFailure::Unavailable(e.to_string())),
        };

        let principal = Principal::Student(student);
        self.persist_or_unavailable(&principal).await?;
        Ok(LoginSuccess {
            redirect_to: principal.dashboard_route(),
            principal,
            token: None,
        })
    }

    /// Name-based quick start. A fuzzy match logs the registered student in;
    /// no match synthesizes a guest principal so the app keeps working
    /// without a backing row. Guests are flagged in storage so downstream
    /// features can tell the ephemeral identity from a persistent one.
    pub async fn quick_login(
        &self,
        name: &str,
        class_name: Option<&str>,
    ) -> Result<LoginSuccess, LoginFailure> {
        let matches = self
            .content
            .search_students_by_name(name)
            .await
            .map_err(|e| LoginFailure::Unavailable(e.to_string()))?;

        let matched = match class_name {
            Some(class) => matches
                .iter()
                .find(|s| s.class_name.as_deref() == Some(class))
                .or_else(|| matches.first()),
            None => matches.first(),
        }
        .cloned();

        let principal = match matched {
            Some(student) => Principal::Student(student),
            None => Principal::Guest(GuestProfile::new(
                name.trim().to_string(),
                class_name.map(str::to_string),
            )),
        };

        self.persist_or_unavailable(&principal).await?;
        Ok(LoginSuccess {
            redirect_to: principal.dashboard_route(),
            principal,
            token: None,
        })
    }

    /// Synthesizes a canned profile for the given role, bypassing every
    /// collaborator. Exists only to sidestep auth-provider outages; the
    /// service decides whether this is reachable at all.
    pub async fn demo_login(&self, role: Role) -> Result<LoginSuccess, LoginFailure> {
        let principal = demo_principal(role);
        self.persist_or_unavailable(&principal).await?;
        Ok(LoginSuccess {
            redirect_to: principal.dashboard_route(),
            principal,
            token: None,
        })
    }

    /// Tears the session down: invalidates the staff token when one exists,
    /// clears every role-scoped storage key, and reports the neutral login
    /// route to navigate to. A provider failure does not keep the local
    /// session alive.
    pub async fn logout(&self, staff_token: Option<&str>) -> PortResult<&'static str> {
        if let Some(token) = staff_token {
            // Local teardown proceeds even if the provider call fails.
            let _ = self.auth.logout(token).await;
        }
        self.sessions.clear().await?;
        Ok(LOGIN_ROUTE)
    }

    async fn persist_or_unavailable(&self, principal: &Principal) -> Result<(), LoginFailure> {
        self.sessions
            .persist(principal)
            .await
            .map_err(|e| LoginFailure::Unavailable(e.to_string()))
    }
}

/// Canned demo profiles, one per role.
fn demo_principal(role: Role) -> Principal {
    let staff = |name: &str, email: &str| StaffProfile {
        id: Uuid::new_v4(),
        display_name: name.to_string(),
        email: email.to_string(),
    };
    match role {
        Role::Admin => Principal::Admin(staff("Demo Admin", "admin@demo.local")),
        Role::Teacher => Principal::Teacher(staff("Demo Teacher", "teacher@demo.local")),
        Role::Parent => Principal::Parent(staff("Demo Parent", "parent@demo.local")),
        Role::Student => Principal::Student(StudentProfile {
            id: Uuid::new_v4(),
            display_name: "Demo Student".to_string(),
            class_name: Some("Demo".to_string()),
            pin_code: "0000".to_string(),
            score: 0,
            stars: 0,
        }),
        Role::Guest => Principal::Guest(GuestProfile::new("Demo Guest".to_string(), None)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::keys;
    use crate::testing::{FakeAuthProvider, FakeContentStore, MemorySessionStore};

    fn staff_admin() -> Principal {
        Principal::Admin(StaffProfile {
            id: Uuid::new_v4(),
            display_name: "Cô Hà".to_string(),
            email: "ha@school.vn".to_string(),
        })
    }

    fn student(name: &str, class: &str, pin: &str) -> StudentProfile {
        StudentProfile {
            id: Uuid::new_v4(),
            display_name: name.to_string(),
            class_name: Some(class.to_string()),
            pin_code: pin.to_string(),
            score: 10,
            stars: 2,
        }
    }

    fn resolver_with(
        auth: FakeAuthProvider,
        content: FakeContentStore,
    ) -> (AuthResolver, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::default());
        let resolver = AuthResolver::new(Arc::new(auth), Arc::new(content), store.clone());
        (resolver, store)
    }

    #[tokio::test]
    async fn test_email_login_persists_and_redirects() {
        let auth = FakeAuthProvider::default().with_account("ha@school.vn", "s3cret", staff_admin());
        let (resolver, store) = resolver_with(auth, FakeContentStore::default());

        let success = resolver
            .login_with_email("ha@school.vn", "s3cret")
            .await
            .unwrap();

        assert_eq!(success.redirect_to, "/admin");
        assert!(success.token.is_some());
        assert!(store.get(keys::CURRENT_ADMIN).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_email_login_rejects_bad_password() {
        let auth = FakeAuthProvider::default().with_account("ha@school.vn", "s3cret", staff_admin());
        let (resolver, store) = resolver_with(auth, FakeContentStore::default());

        let failure = resolver
            .login_with_email("ha@school.vn", "wrong")
            .await
            .unwrap_err();

        assert!(matches!(failure, LoginFailure::InvalidCredentials));
        assert_eq!(failure.user_message(), "Email hoặc mật khẩu không đúng");
        assert!(store.get(keys::CURRENT_ADMIN).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pin_login_exact_match() {
        let content = FakeContentStore::with_students(vec![student("Linh", "3A", "1234")]);
        let (resolver, _) = resolver_with(FakeAuthProvider::default(), content);

        let success = resolver.login_with_pin("1234").await.unwrap();
        assert_eq!(success.redirect_to, "/student");
        match success.principal {
            Principal::Student(p) => assert_eq!(p.display_name, "Linh"),
            other => panic!("expected student, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pin_login_miss_reports_invalid_pin() {
        let content = FakeContentStore::with_students(vec![student("Linh", "3A", "1234")]);
        let (resolver, store) = resolver_with(FakeAuthProvider::default(), content);

        let failure = resolver.login_with_pin("9999").await.unwrap_err();

        assert!(matches!(failure, LoginFailure::InvalidPin));
        assert_eq!(failure.user_message(), "Mã PIN không đúng");
        assert!(store.get(keys::CURRENT_STUDENT).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quick_login_matches_registered_student() {
        let registered = student("Nguyễn Minh", "2B", "5678");
        let expected_id = registered.id;
        let content = FakeContentStore::with_students(vec![registered]);
        let (resolver, store) = resolver_with(FakeAuthProvider::default(), content);

        let success = resolver.quick_login("minh", Some("2B")).await.unwrap();

        match success.principal {
            Principal::Student(p) => assert_eq!(p.id, expected_id),
            other => panic!("expected student, got {other:?}"),
        }
        assert!(store.get(keys::IS_GUEST).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quick_login_falls_back_to_guest() {
        let content = FakeContentStore::with_students(vec![student("Linh", "3A", "1234")]);
        let (resolver, store) = resolver_with(FakeAuthProvider::default(), content);

        let success = resolver.quick_login("Tuấn", Some("1C")).await.unwrap();

        assert!(success.principal.is_guest());
        match &success.principal {
            Principal::Guest(p) => {
                assert_eq!(p.display_name, "Tuấn");
                assert_eq!(p.score, 0);
                assert_eq!(p.stars, 0);
            }
            other => panic!("expected guest, got {other:?}"),
        }
        assert_eq!(
            store.get(keys::IS_GUEST).await.unwrap(),
            Some("true".to_string())
        );
    }

    #[tokio::test]
    async fn test_check_auth_prefers_staff_session() {
        let auth = FakeAuthProvider::default().with_account("ha@school.vn", "s3cret", staff_admin());
        let (resolver, _) = resolver_with(auth, FakeContentStore::default());
        let token = resolver
            .login_with_email("ha@school.vn", "s3cret")
            .await
            .unwrap()
            .token
            .unwrap();

        let snapshot = resolver.check_auth(Some(&token), "/login").await.unwrap();

        assert_eq!(snapshot.redirect_to, Some("/admin"));
        assert!(matches!(snapshot.principal, Some(Principal::Admin(_))));
    }

    #[tokio::test]
    async fn test_check_auth_falls_back_to_stored_student() {
        let content = FakeContentStore::with_students(vec![student("Linh", "3A", "1234")]);
        let (resolver, _) = resolver_with(FakeAuthProvider::default(), content);
        resolver.login_with_pin("1234").await.unwrap();

        // Resolution is idempotent across repeated calls.
        for _ in 0..2 {
            let snapshot = resolver.check_auth(None, "/login").await.unwrap();
            assert!(matches!(snapshot.principal, Some(Principal::Student(_))));
            assert_eq!(snapshot.redirect_to, Some("/student"));
        }
    }

    #[tokio::test]
    async fn test_check_auth_does_not_redirect_off_login_routes() {
        let content = FakeContentStore::with_students(vec![student("Linh", "3A", "1234")]);
        let (resolver, _) = resolver_with(FakeAuthProvider::default(), content);
        resolver.login_with_pin("1234").await.unwrap();

        let snapshot = resolver.check_auth(None, "/student/games").await.unwrap();

        assert!(snapshot.principal.is_some());
        assert_eq!(snapshot.redirect_to, None);
    }

    #[tokio::test]
    async fn test_logout_clears_every_role_key() {
        let auth = FakeAuthProvider::default().with_account("ha@school.vn", "s3cret", staff_admin());
        let content = FakeContentStore::with_students(vec![student("Linh", "3A", "1234")]);
        let (resolver, store) = resolver_with(auth, content);

        resolver.login_with_pin("1234").await.unwrap();
        let token = resolver
            .login_with_email("ha@school.vn", "s3cret")
            .await
            .unwrap()
            .token
            .unwrap();

        let route = resolver.logout(Some(&token)).await.unwrap();

        assert_eq!(route, LOGIN_ROUTE);
        for key in keys::ALL {
            assert!(store.get(key).await.unwrap().is_none(), "{key} survived");
        }
        let snapshot = resolver.check_auth(Some(&token), "/login").await.unwrap();
        assert!(snapshot.principal.is_none());
    }

    #[tokio::test]
    async fn test_demo_login_covers_every_role() {
        for role in [
            Role::Admin,
            Role::Teacher,
            Role::Parent,
            Role::Student,
            Role::Guest,
        ] {
            let (resolver, _) =
                resolver_with(FakeAuthProvider::default(), FakeContentStore::default());
            let success = resolver.demo_login(role).await.unwrap();
            assert_eq!(success.principal.role(), role);
            assert_eq!(success.redirect_to, role.dashboard_route());
        }
    }
}
