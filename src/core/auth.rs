//! Password gate
//!
//! The password hash lives in the persistent store; the unlocked flag and the
//! failed attempt counter live in the session store, so every new process
//! starts locked.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::storage::KeyValueStore;

const HASH_KEY: &str = "auth:password_sha256";
const UNLOCKED_KEY: &str = "auth:unlocked";
const FAILURES_KEY: &str = "auth:failures";
const LOCKED_UNTIL_KEY: &str = "auth:locked_until";

/// Consecutive failures allowed before the gate refuses further attempts
pub const MAX_ATTEMPTS: u32 = 5;
/// How long the gate refuses attempts after too many failures
pub const LOCKOUT_SECS: i64 = 30;

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("wrong password ({remaining} attempts left)")]
    WrongPassword { remaining: u32 },
    #[error("too many attempts, try again in {seconds}s")]
    LockedOut { seconds: i64 },
    #[error("storage error: {0}")]
    Storage(String),
}

/// Password gate over a persistent and a session store
pub struct PasswordGate<'a, P: KeyValueStore, S: KeyValueStore> {
    persistent: &'a mut P,
    session: &'a mut S,
}

fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn storage_err(e: anyhow::Error) -> AuthError {
    AuthError::Storage(e.to_string())
}

impl<'a, P: KeyValueStore, S: KeyValueStore> PasswordGate<'a, P, S> {
    pub fn new(persistent: &'a mut P, session: &'a mut S) -> Self {
        Self {
            persistent,
            session,
        }
    }

    pub fn has_password(&self) -> bool {
        self.persistent.contains(HASH_KEY)
    }

    /// Open when no password is configured or the session has been unlocked
    pub fn is_unlocked(&self) -> bool {
        !self.has_password() || self.session.get(UNLOCKED_KEY).as_deref() == Some("1")
    }

    pub fn set_password(&mut self, password: &str) -> Result<(), AuthError> {
        if password.is_empty() {
            return Err(AuthError::EmptyPassword);
        }
        self.persistent
            .set(HASH_KEY, &hash_password(password))
            .map_err(storage_err)?;
        self.session.set(UNLOCKED_KEY, "1").map_err(storage_err)?;
        tracing::info!("Password updated");
        Ok(())
    }

    pub fn clear_password(&mut self) -> Result<(), AuthError> {
        self.persistent.remove(HASH_KEY).map_err(storage_err)?;
        tracing::info!("Password removed");
        Ok(())
    }

    pub fn verify(&self, password: &str) -> bool {
        match self.persistent.get(HASH_KEY) {
            Some(stored) => stored == hash_password(password),
            None => true,
        }
    }

    pub fn unlock(&mut self, password: &str) -> Result<(), AuthError> {
        self.unlock_at(password, Utc::now())
    }

    fn unlock_at(&mut self, password: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        if let Some(until) = self
            .session
            .get(LOCKED_UNTIL_KEY)
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
        {
            let remaining = until.with_timezone(&Utc) - now;
            if remaining > Duration::zero() {
                return Err(AuthError::LockedOut {
                    seconds: remaining.num_seconds().max(1),
                });
            }
            self.session.remove(LOCKED_UNTIL_KEY).map_err(storage_err)?;
        }

        if self.verify(password) {
            self.session.remove(FAILURES_KEY).map_err(storage_err)?;
            self.session.set(UNLOCKED_KEY, "1").map_err(storage_err)?;
            tracing::info!("Notebook unlocked");
            return Ok(());
        }

        let failures = self
            .session
            .get(FAILURES_KEY)
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0)
            + 1;
        tracing::warn!("Failed unlock attempt ({})", failures);

        if failures >= MAX_ATTEMPTS {
            let until = now + Duration::seconds(LOCKOUT_SECS);
            self.session.remove(FAILURES_KEY).map_err(storage_err)?;
            self.session
                .set(LOCKED_UNTIL_KEY, &until.to_rfc3339())
                .map_err(storage_err)?;
            return Err(AuthError::LockedOut {
                seconds: LOCKOUT_SECS,
            });
        }

        self.session
            .set(FAILURES_KEY, &failures.to_string())
            .map_err(storage_err)?;
        Err(AuthError::WrongPassword {
            remaining: MAX_ATTEMPTS - failures,
        })
    }

    pub fn lock(&mut self) -> Result<(), AuthError> {
        self.session.remove(UNLOCKED_KEY).map_err(storage_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryStore;

    #[test]
    fn test_open_without_password() {
        let mut persistent = MemoryStore::new();
        let mut session = MemoryStore::new();
        let gate = PasswordGate::new(&mut persistent, &mut session);
        assert!(!gate.has_password());
        assert!(gate.is_unlocked());
    }

    #[test]
    fn test_new_session_starts_locked() {
        let mut persistent = MemoryStore::new();
        {
            let mut session = MemoryStore::new();
            let mut gate = PasswordGate::new(&mut persistent, &mut session);
            gate.set_password("hunter2").unwrap();
            assert!(gate.is_unlocked());
        }

        let mut session = MemoryStore::new();
        let mut gate = PasswordGate::new(&mut persistent, &mut session);
        assert!(!gate.is_unlocked());
        assert_eq!(
            gate.unlock("nope"),
            Err(AuthError::WrongPassword { remaining: 4 })
        );
        gate.unlock("hunter2").unwrap();
        assert!(gate.is_unlocked());
        gate.lock().unwrap();
        assert!(!gate.is_unlocked());
    }

    #[test]
    fn test_hash_is_not_plaintext() {
        let mut persistent = MemoryStore::new();
        let mut session = MemoryStore::new();
        PasswordGate::new(&mut persistent, &mut session)
            .set_password("secret")
            .unwrap();
        let stored = persistent.get(HASH_KEY).unwrap();
        assert_eq!(stored.len(), 64);
        assert_ne!(stored, "secret");
    }

    #[test]
    fn test_lockout_after_repeated_failures() {
        let mut persistent = MemoryStore::new();
        let mut session = MemoryStore::new();
        let mut gate = PasswordGate::new(&mut persistent, &mut session);
        gate.set_password("right").unwrap();
        gate.lock().unwrap();

        let start = Utc::now();
        for _ in 0..MAX_ATTEMPTS - 1 {
            assert!(matches!(
                gate.unlock_at("wrong", start),
                Err(AuthError::WrongPassword { .. })
            ));
        }
        assert_eq!(
            gate.unlock_at("wrong", start),
            Err(AuthError::LockedOut { seconds: LOCKOUT_SECS })
        );
        assert!(matches!(
            gate.unlock_at("right", start + Duration::seconds(10)),
            Err(AuthError::LockedOut { .. })
        ));

        gate.unlock_at("right", start + Duration::seconds(LOCKOUT_SECS + 1))
            .unwrap();
        assert!(gate.is_unlocked());
    }

    #[test]
    fn test_empty_password_rejected() {
        let mut persistent = MemoryStore::new();
        let mut session = MemoryStore::new();
        let mut gate = PasswordGate::new(&mut persistent, &mut session);
        assert_eq!(gate.set_password(""), Err(AuthError::EmptyPassword));
    }
}
