//! User management service
//!
//! All user-related business logic lives here.
//! HTTP handlers should be thin wrappers that delegate to this service.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{
    Caller, CreateUserDto, DomainError, DomainResult, RepositoryProvider, User, UserSummary,
};
use crate::infrastructure::crypto::jwt::{create_token, JwtConfig};
use crate::infrastructure::crypto::password::{hash_password, verify_password};
use crate::shared::validations::non_blank;

/// Authentication result returned after a successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

/// Self-service sign-up fields
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Orchestrates registration, login and user administration.
pub struct UserService {
    repos: Arc<dyn RepositoryProvider>,
    jwt_config: JwtConfig,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, jwt_config: JwtConfig, bcrypt_cost: u32) -> Self {
        Self {
            repos,
            jwt_config,
            bcrypt_cost,
        }
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    // ── Authentication ──────────────────────────────────────────

    /// Authenticate user by username + password and return a JWT.
    pub async fn authenticate(&self, username: &str, password: &str) -> DomainResult<AuthResult> {
        let Some(user) = self.repos.users().get_user_by_username(username.trim()).await? else {
            warn!(username, "Login attempt for unknown user");
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        };

        let valid = verify_password(password, &user.password_hash).unwrap_or(false);
        if !valid {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        }

        let token = create_token(&user.id, &user.username, user.is_admin, &self.jwt_config)
            .map_err(|e| DomainError::Storage(format!("Failed to create token: {}", e)))?;

        info!(user_id = %user.id, "User logged in");
        Ok(AuthResult {
            token,
            token_type: "Bearer".into(),
            expires_in: self.jwt_config.expiration_hours * 3600,
            user,
        })
    }

    // ── Registration ────────────────────────────────────────────

    /// Register a new regular (non-admin) user.
    pub async fn register(&self, input: RegisterUser) -> DomainResult<User> {
        let username = non_blank(&input.username)
            .ok_or_else(|| DomainError::InvalidInput("Username is required".into()))?;
        if username.len() < 3 || username.len() > 50 {
            return Err(DomainError::InvalidInput(
                "Username must be 3-50 characters".into(),
            ));
        }
        if input.password.len() < 8 {
            return Err(DomainError::InvalidInput(
                "Password must be at least 8 characters".into(),
            ));
        }
        let email = input.email.as_deref().and_then(non_blank).map(str::to_string);
        if email.as_deref().is_some_and(|e| !e.contains('@')) {
            return Err(DomainError::InvalidInput("Invalid email address".into()));
        }
        let phone = input.phone.as_deref().and_then(non_blank).map(str::to_string);

        let dto = CreateUserDto {
            username: username.to_string(),
            email,
            phone,
            password_hash: String::new(),
            is_admin: false,
        };
        let user = self.create(dto, &input.password).await?;

        info!(user_id = %user.id, username = %user.username, "New user registered");
        Ok(user)
    }

    /// Create the configured administrator unless one already exists.
    ///
    /// Returns the new admin, or `None` when an admin was already present.
    pub async fn ensure_default_admin(
        &self,
        username: &str,
        password: &str,
    ) -> DomainResult<Option<User>> {
        if self.repos.users().admin_exists().await? {
            return Ok(None);
        }

        let dto = CreateUserDto {
            username: username.to_string(),
            email: None,
            phone: None,
            password_hash: String::new(),
            is_admin: true,
        };
        let admin = self.create(dto, password).await?;

        info!(user_id = %admin.id, username = %admin.username, "Default admin created");
        Ok(Some(admin))
    }

    async fn create(&self, mut dto: CreateUserDto, password: &str) -> DomainResult<User> {
        dto.password_hash = hash_password(password, self.bcrypt_cost)
            .map_err(|e| DomainError::Storage(format!("Failed to hash password: {}", e)))?;
        self.repos.users().create_user(dto).await
    }

    // ── Queries ─────────────────────────────────────────────────

    /// The caller's own account
    pub async fn current_user(&self, caller: &Caller) -> DomainResult<User> {
        self.repos
            .users()
            .get_user_by_id(&caller.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", &caller.user_id))
    }

    /// Non-admin users with their booking counts.
    pub async fn list_users(&self, caller: &Caller) -> DomainResult<Vec<UserSummary>> {
        caller.require_admin()?;
        self.repos.users().list_regular_users().await
    }

    // ── Commands (mutations) ────────────────────────────────────

    /// Delete a regular user together with their reservation history.
    pub async fn delete_user(&self, caller: &Caller, id: &str) -> DomainResult<()> {
        caller.require_admin()?;

        let user = self
            .repos
            .users()
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", id))?;
        if user.is_admin {
            return Err(DomainError::InvalidState(
                "administrator accounts cannot be deleted".into(),
            ));
        }

        self.repos.users().delete_user(id).await?;
        info!(user_id = id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::crypto::jwt::verify_token;
    use crate::infrastructure::database::testing::memory_repos;

    async fn service() -> UserService {
        let (_db, repos) = memory_repos().await;
        UserService::new(repos, JwtConfig::new("test-secret", 1), 4)
    }

    fn signup(username: &str) -> RegisterUser {
        RegisterUser {
            username: username.to_string(),
            password: "correct-horse".to_string(),
            email: Some(format!("{}@example.com", username)),
            phone: None,
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let service = service().await;
        let user = service.register(signup("alice")).await.unwrap();
        assert!(!user.is_admin);
        assert_ne!(user.password_hash, "correct-horse");

        let auth = service.authenticate("alice", "correct-horse").await.unwrap();
        assert_eq!(auth.token_type, "Bearer");
        assert_eq!(auth.expires_in, 3600);

        let claims = verify_token(&auth.token, service.jwt_config()).unwrap();
        assert_eq!(claims.sub, user.id);
        assert!(!claims.is_admin);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let service = service().await;
        service.register(signup("alice")).await.unwrap();

        for (name, password) in [("alice", "wrong-password"), ("nobody", "correct-horse")] {
            let err = service.authenticate(name, password).await.unwrap_err();
            assert!(matches!(err, DomainError::Unauthorized(_)));
        }
    }

    #[tokio::test]
    async fn register_validates_and_rejects_duplicates() {
        let service = service().await;

        let mut short = signup("alice");
        short.password = "short".into();
        assert!(matches!(
            service.register(short).await.unwrap_err(),
            DomainError::InvalidInput(_)
        ));

        let mut bad_email = signup("alice");
        bad_email.email = Some("not-an-email".into());
        assert!(matches!(
            service.register(bad_email).await.unwrap_err(),
            DomainError::InvalidInput(_)
        ));

        service.register(signup("alice")).await.unwrap();
        assert!(matches!(
            service.register(signup("alice")).await.unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn default_admin_is_created_once() {
        let service = service().await;

        let admin = service.ensure_default_admin("admin", "admin-pass").await.unwrap();
        assert!(admin.is_some_and(|a| a.is_admin));
        assert!(service.ensure_default_admin("admin", "admin-pass").await.unwrap().is_none());

        let auth = service.authenticate("admin", "admin-pass").await.unwrap();
        assert!(auth.user.is_admin);
    }

    #[tokio::test]
    async fn admin_lists_and_deletes_users() {
        let service = service().await;
        let admin = service.ensure_default_admin("admin", "admin-pass").await.unwrap().unwrap();
        let alice = service.register(signup("alice")).await.unwrap();
        let admin_caller = Caller::admin(admin.id.clone());

        let users = service.list_users(&admin_caller).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user.username, "alice");

        assert!(matches!(
            service.list_users(&Caller::user(alice.id.clone())).await.unwrap_err(),
            DomainError::Forbidden(_)
        ));
        assert!(matches!(
            service.delete_user(&admin_caller, &admin.id).await.unwrap_err(),
            DomainError::InvalidState(_)
        ));

        service.delete_user(&admin_caller, &alice.id).await.unwrap();
        assert!(service.list_users(&admin_caller).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn current_user_resolves_caller() {
        let service = service().await;
        let alice = service.register(signup("alice")).await.unwrap();

        let me = service.current_user(&Caller::user(alice.id.clone())).await.unwrap();
        assert_eq!(me.username, "alice");
    }
}
