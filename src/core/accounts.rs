//! User directory
//!
//! Registration, password checks and login lockout for dashboard users.
//! Passwords are stored as the SHA-256 hex digest of `salt:password`.

use crate::config::LockoutPolicy;
use crate::core::lockout::{is_locked, register_failure, register_success};
use crate::types::{ErpError, LoginState, Role, RoleProfile, UserAccount};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, warn};

const MIN_PASSWORD_LEN: usize = 6;

/// SHA-256 hex digest of `salt:password`
pub fn hash_password(salt: &str, password: &str) -> String {
    let digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(b":")
        .chain_update(password.as_bytes())
        .finalize();

    format!("{:x}", digest)
}

pub struct Directory {
    users: HashMap<String, UserAccount>,
    salt: String,
    policy: LockoutPolicy,
}

impl Directory {
    pub fn new(salt: impl Into<String>, policy: LockoutPolicy) -> Self {
        Directory {
            users: HashMap::new(),
            salt: salt.into(),
            policy,
        }
    }

    /// Register a user
    ///
    /// # Errors
    ///
    /// - `Validation` if the username is blank or the password is shorter than
    ///   six characters
    /// - `DuplicateUser` if the username is taken
    pub fn register(
        &mut self,
        username: &str,
        password: &str,
        profile: RoleProfile,
    ) -> Result<&UserAccount, ErpError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ErpError::validation("username", "username is required"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ErpError::validation(
                "password",
                format!("password must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        if self.users.contains_key(username) {
            return Err(ErpError::DuplicateUser {
                username: username.to_string(),
            });
        }

        let account = UserAccount {
            username: username.to_string(),
            password_hash: hash_password(&self.salt, password),
            profile,
            login: LoginState::default(),
            last_login: None,
        };
        debug!(username = %username, role = %account.role(), "Registered user");
        Ok(&*self.users.entry(username.to_string()).or_insert(account))
    }

    /// Check credentials at `now`
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` for an unknown user or a wrong password
    /// - `AccountLocked` while a lock is in force, even with the right
    ///   password
    pub fn login(&mut self, username: &str, password: &str, now: DateTime<Utc>) -> Result<&UserAccount, ErpError> {
        let hash = hash_password(&self.salt, password);
        let account = self
            .users
            .get_mut(username.trim())
            .ok_or(ErpError::InvalidCredentials)?;

        if is_locked(&account.login, now) {
            if let Some(until) = account.login.locked_until {
                return Err(ErpError::AccountLocked {
                    username: account.username.clone(),
                    until,
                });
            }
        }

        if account.password_hash != hash {
            account.login = register_failure(&account.login, &self.policy, now);
            warn!(
                username = %account.username,
                attempts = account.login.attempts,
                "Failed login"
            );
            return Err(ErpError::InvalidCredentials);
        }

        account.login = register_success();
        account.last_login = Some(now);
        Ok(&*account)
    }

    pub fn get(&self, username: &str) -> Option<&UserAccount> {
        self.users.get(username)
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Resolve the acting user and check their role
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` if no actor is given or the actor is unknown
    /// - `Forbidden` if the actor's role is not in `allowed`
    pub fn authorize(
        &self,
        actor: Option<&str>,
        allowed: &[Role],
        action: &str,
    ) -> Result<&UserAccount, ErpError> {
        let account = actor
            .and_then(|username| self.users.get(username))
            .ok_or(ErpError::Unauthenticated)?;

        if !allowed.contains(&account.role()) {
            return Err(ErpError::forbidden(account.role(), action));
        }
        Ok(account)
    }
}
