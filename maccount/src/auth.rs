//! Authentication provider contract and an in-process implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use mcommon::{BoxFuture, UserId};
use tokio::sync::watch;

use crate::error::AccountError;

const MIN_PASSWORD_LEN: usize = 6;
const UID_LEN: usize = 28;

/// Identity issued by the authentication service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub uid: UserId,
    pub email: String,
}

pub trait AuthProvider: Send + Sync {
    fn sign_in<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<AuthIdentity, AccountError>>;

    fn sign_up<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<AuthIdentity, AccountError>>;

    fn sign_out<'a>(&'a self) -> BoxFuture<'a, Result<(), AccountError>>;

    /// Auth state channel. The current value is available immediately.
    fn subscribe(&self) -> watch::Receiver<Option<AuthIdentity>>;

    fn current(&self) -> Option<AuthIdentity> {
        self.subscribe().borrow().clone()
    }
}

#[derive(Debug, Clone)]
struct Credential {
    uid: UserId,
    password: String,
}

/// Email/password accounts held in memory.
#[derive(Debug)]
pub struct InMemoryAuthProvider {
    accounts: Mutex<HashMap<String, Credential>>,
    state: watch::Sender<Option<AuthIdentity>>,
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            state: watch::Sender::new(None),
        }
    }
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn accounts(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Credential>>, AccountError> {
        self.accounts
            .lock()
            .map_err(|_| AccountError::storage("auth provider lock poisoned"))
    }

    fn publish(&self, identity: Option<AuthIdentity>) {
        self.state.send_replace(identity);
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

impl AuthProvider for InMemoryAuthProvider {
    fn sign_in<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<AuthIdentity, AccountError>> {
        Box::pin(async move {
            let email = normalize_email(email);
            let uid = {
                let accounts = self.accounts()?;
                match accounts.get(&email) {
                    Some(credential) if credential.password == password => credential.uid.clone(),
                    _ => return Err(AccountError::authentication("Invalid email or password.")),
                }
            };

            let identity = AuthIdentity { uid, email };
            self.publish(Some(identity.clone()));
            Ok(identity)
        })
    }

    fn sign_up<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<AuthIdentity, AccountError>> {
        Box::pin(async move {
            let email = normalize_email(email);
            if !email.contains('@') {
                return Err(AccountError::invalid_input("Invalid email address."));
            }
            if password.chars().count() < MIN_PASSWORD_LEN {
                return Err(AccountError::invalid_input(
                    "Password should be at least 6 characters.",
                ));
            }

            let uid = {
                let mut accounts = self.accounts()?;
                if accounts.contains_key(&email) {
                    return Err(AccountError::authentication("Email already in use."));
                }
                let uid = UserId::new(mcommon::opaque_token(UID_LEN));
                accounts.insert(
                    email.clone(),
                    Credential {
                        uid: uid.clone(),
                        password: password.to_string(),
                    },
                );
                uid
            };

            let identity = AuthIdentity { uid, email };
            self.publish(Some(identity.clone()));
            Ok(identity)
        })
    }

    fn sign_out<'a>(&'a self) -> BoxFuture<'a, Result<(), AccountError>> {
        Box::pin(async move {
            self.publish(None);
            Ok(())
        })
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthIdentity>> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AccountErrorKind;

    #[tokio::test]
    async fn sign_up_then_sign_in_publishes_identity() {
        let auth = InMemoryAuthProvider::new();
        let mut state = auth.subscribe();
        assert_eq!(*state.borrow(), None);

        let created = auth
            .sign_up("Asha@Example.com ", "secret1")
            .await
            .expect("sign up");
        assert_eq!(created.email, "asha@example.com");
        assert!(state.has_changed().expect("sender alive"));
        assert_eq!(state.borrow_and_update().clone(), Some(created.clone()));

        auth.sign_out().await.expect("sign out");
        assert_eq!(auth.current(), None);

        let signed_in = auth
            .sign_in("asha@example.com", "secret1")
            .await
            .expect("sign in");
        assert_eq!(signed_in, created);
        assert_eq!(auth.current(), Some(created));
    }

    #[tokio::test]
    async fn bad_credentials_and_duplicates_are_rejected() {
        let auth = InMemoryAuthProvider::new();
        auth.sign_up("a@b.c", "secret1").await.expect("sign up");

        let wrong = auth.sign_in("a@b.c", "nope").await.expect_err("wrong password");
        assert_eq!(wrong.kind, AccountErrorKind::Authentication);

        let duplicate = auth.sign_up("a@b.c", "secret2").await.expect_err("duplicate");
        assert_eq!(duplicate.kind, AccountErrorKind::Authentication);

        let weak = auth.sign_up("x@y.z", "123").await.expect_err("weak password");
        assert_eq!(weak.kind, AccountErrorKind::InvalidInput);
    }
}
