//! Registration, login and session management.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Duration;
use lazy_static::lazy_static;
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::Config;
use crate::db::{self, DbPool, MemberResponse, NewUser, Session, User, UserResponse};
use crate::error::{conflict_on_unique, ServiceError, ServiceResult};
use crate::validation::{validate_login, validate_registration, Input};

const EMAIL_TAKEN: &str = "The email has already been taken.";

lazy_static! {
    /// Verified against when the email is unknown, so a failed login costs
    /// the same whether or not the account exists
    static ref DUMMY_HASH: String =
        hash_password("gymdesk-timing-equalizer").unwrap_or_default();
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random session token
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// The session a request was authenticated with, and its user
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub session: Session,
}

/// A successful login: the user and the plaintext token, shown once
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
}

pub struct AuthService<'a> {
    db: &'a DbPool,
    config: &'a Config,
    clock: &'a dyn Clock,
}

impl<'a> AuthService<'a> {
    pub fn new(db: &'a DbPool, config: &'a Config, clock: &'a dyn Clock) -> Self {
        Self { db, config, clock }
    }

    /// Create an account. No session is issued.
    pub async fn register(&self, input: &Input) -> ServiceResult<User> {
        let registration = validate_registration(input, &self.config.auth.password)?;

        let password_hash = hash_password(&registration.password)
            .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {}", e)))?;

        let now = self.clock.now();
        let id = uuid::Uuid::new_v4().to_string();

        let mut tx = db::begin_write(self.db).await?;

        if db::find_user_by_email(&mut *tx, &registration.email)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(EMAIL_TAKEN.to_string()));
        }

        db::insert_user(
            &mut *tx,
            &NewUser {
                id: &id,
                name: &registration.name,
                email: &registration.email,
                password_hash: &password_hash,
                now,
            },
        )
        .await
        .map_err(|e| conflict_on_unique(e, EMAIL_TAKEN))?;

        let user = db::find_user_by_id(&mut *tx, &id)
            .await?
            .ok_or_else(|| ServiceError::Internal("registered user vanished".to_string()))?;

        tx.commit().await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and mint a session token
    pub async fn login(&self, input: &Input) -> ServiceResult<LoginOutcome> {
        let credentials = validate_login(input)?;

        let user = db::find_user_by_email(self.db, &credentials.email).await?;

        let user = match user {
            Some(user) if verify_password(&credentials.password, &user.password_hash) => user,
            Some(user) => {
                debug!(user_id = %user.id, "Login failed: wrong password");
                return Err(ServiceError::InvalidCredentials);
            }
            None => {
                verify_password(&credentials.password, &DUMMY_HASH);
                debug!("Login failed: unknown email");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let token = generate_token();
        let now = self.clock.now();
        let expires_at = now + Duration::hours(self.config.auth.session_ttl_hours);

        db::insert_session(
            self.db,
            &uuid::Uuid::new_v4().to_string(),
            &user.id,
            &hash_token(&token),
            expires_at,
            now,
        )
        .await?;

        info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome { user, token })
    }

    /// Resolve a bearer token to its live session and user
    pub async fn resolve_token(&self, token: &str) -> ServiceResult<AuthSession> {
        let token_hash = hash_token(token);

        let session = db::find_live_session(self.db, &token_hash, self.clock.now())
            .await?
            .ok_or(ServiceError::Unauthenticated)?;

        if !bool::from(session.token_hash.as_bytes().ct_eq(token_hash.as_bytes())) {
            return Err(ServiceError::Unauthenticated);
        }

        let user = db::find_user_by_id(self.db, &session.user_id)
            .await?
            .ok_or(ServiceError::Unauthenticated)?;

        Ok(AuthSession { user, session })
    }

    /// Revoke the session the request was made with
    pub async fn logout(&self, auth: &AuthSession) -> ServiceResult<()> {
        db::delete_session(self.db, &auth.session.id).await?;
        info!(user_id = %auth.user.id, "User logged out");
        Ok(())
    }

    /// Revoke every session of the user, returning how many were removed
    pub async fn logout_all_devices(&self, user: &User) -> ServiceResult<u64> {
        let revoked = db::delete_sessions_for_user(self.db, &user.id).await?;
        info!(user_id = %user.id, revoked, "User logged out of all devices");
        Ok(revoked)
    }

    /// The current user with their member profile, if any
    pub async fn authenticated_user(&self, actor: Option<&User>) -> ServiceResult<UserResponse> {
        let user = actor.ok_or(ServiceError::Unauthenticated)?;

        let profile = db::find_member_by_user(self.db, &user.id, false).await?;

        let mut response = UserResponse::from(user.clone());
        response.member_profile = profile
            .map(|p| Box::new(MemberResponse::new(p, None, self.clock.today())));
        Ok(response)
    }

    pub async fn purge_expired_sessions(&self) -> ServiceResult<u64> {
        Ok(db::purge_expired_sessions(self.db, self.clock.now()).await?)
    }
}
