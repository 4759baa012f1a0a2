pub mod credentials;
pub mod ownership;
pub mod password;

pub use credentials::{extract_credentials, Credentials};
pub use ownership::{authorize_mutation, mutate_owned_course, Decision, Mutation};
pub use password::{HashingError, SecretHasher};

use crate::{
    db::{Database, StoreError},
    models::{NewUser, Registration, User, UserId},
    utils::{config::HashingConfig, ApiError},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated identity attached to a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email_address: user.email_address,
        }
    }
}

/// Why a request failed authentication. The first three kinds are only ever
/// logged; clients see the same 401 for all of them.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header not found")]
    MissingCredentials,
    #[error("user not found")]
    UserNotFound,
    #[error("password verification failed")]
    BadSecret,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Hashing(#[from] HashingError),
}

impl AuthError {
    /// True for the kinds that collapse into a 401
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::MissingCredentials | Self::UserNotFound | Self::BadSecret)
    }
}

/// Authentication service
pub struct AuthService {
    db: Arc<dyn Database>,
    hasher: SecretHasher,
    decoy_hash: String,
}

impl AuthService {
    pub fn new(db: Arc<dyn Database>, hashing: &HashingConfig) -> anyhow::Result<Self> {
        let hasher = SecretHasher::new(hashing)?;
        // Verified against when the identifier is unknown, so both failure
        // paths spend one verification.
        let decoy_hash = hasher.hash("decoy-password-for-unknown-users")?;

        Ok(Self {
            db,
            hasher,
            decoy_hash,
        })
    }

    /// Resolve credentials to a user, or say why not.
    pub async fn authenticate(&self, credentials: Option<Credentials>) -> Result<AuthUser, AuthError> {
        let Credentials { identifier, secret } = credentials.ok_or(AuthError::MissingCredentials)?;

        match self.db.find_user_by_email(&identifier).await? {
            Some(user) => {
                if self
                    .hasher
                    .verify_blocking(secret, user.password_hash.clone())
                    .await?
                {
                    Ok(user.into())
                } else {
                    Err(AuthError::BadSecret)
                }
            }
            None => {
                let _ = self
                    .hasher
                    .verify_blocking(secret, self.decoy_hash.clone())
                    .await?;
                Err(AuthError::UserNotFound)
            }
        }
    }

    /// Hash the password and store the new user. This is the only place a
    /// password hash is computed.
    pub async fn register(&self, registration: Registration) -> Result<User, ApiError> {
        let Registration {
            first_name,
            last_name,
            email_address,
            password,
        } = registration;

        let password_hash = self.hasher.hash_blocking(password).await?;

        let user = self
            .db
            .create_user(NewUser {
                first_name,
                last_name,
                email_address,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }
}

/// Authentication gate for protected routes. Attaches [`AuthUser`] to the
/// request on success; otherwise ends the request with a 401.
pub async fn require_auth(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credentials = extract_credentials(request.headers());

    match auth_service.authenticate(credentials).await {
        Ok(auth_user) => {
            request.extensions_mut().insert(auth_user);
            Ok(next.run(request).await)
        }
        Err(err) => {
            if err.is_rejection() {
                tracing::warn!(reason = %err, "Authentication failed");
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDatabase;

    const CHEAP: HashingConfig = HashingConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    };

    async fn service_with_user(password: &str) -> AuthService {
        let service = AuthService::new(Arc::new(MemoryDatabase::new()), &CHEAP).unwrap();
        service
            .register(Registration {
                first_name: "A".into(),
                last_name: "B".into(),
                email_address: "a@b.com".into(),
                password: password.into(),
            })
            .await
            .unwrap();
        service
    }

    fn creds(identifier: &str, secret: &str) -> Option<Credentials> {
        Some(Credentials {
            identifier: identifier.into(),
            secret: secret.into(),
        })
    }

    #[tokio::test]
    async fn valid_credentials_resolve_the_user() {
        let service = service_with_user("abc12345").await;
        let user = service.authenticate(creds("a@b.com", "abc12345")).await.unwrap();
        assert_eq!(user.email_address, "a@b.com");
        assert_eq!(user.id, 1);
    }

    #[tokio::test]
    async fn each_failure_kind_is_distinguished_internally() {
        let service = service_with_user("abc12345").await;

        assert!(matches!(
            service.authenticate(None).await,
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            service.authenticate(creds("nobody@b.com", "abc12345")).await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            service.authenticate(creds("a@b.com", "abc12346")).await,
            Err(AuthError::BadSecret)
        ));
    }

    #[tokio::test]
    async fn stored_hash_is_not_the_plaintext() {
        let db = Arc::new(MemoryDatabase::new());
        let service = AuthService::new(db.clone(), &CHEAP).unwrap();
        service
            .register(Registration {
                first_name: "A".into(),
                last_name: "B".into(),
                email_address: "a@b.com".into(),
                password: "abc12345".into(),
            })
            .await
            .unwrap();

        let stored = db.find_user_by_email("a@b.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "abc12345");
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[test]
    fn rejections_are_flagged() {
        assert!(AuthError::BadSecret.is_rejection());
        assert!(!AuthError::Store(StoreError::Unavailable("down".into())).is_rejection());
    }
}
