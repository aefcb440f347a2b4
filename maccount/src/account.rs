use std::sync::Arc;

use mcommon::UserId;
use mstore::{DocumentStore, DocumentStoreExt, TypedSubscription};

use crate::admin::AdminConsole;
use crate::auth::{AuthIdentity, AuthProvider};
use crate::error::AccountError;
use crate::inbox::{Inbox, SystemMessage};
use crate::ledger::CreditLedger;
use crate::paths;
use crate::user::{Account, User};

pub const WELCOME_TITLE: &str = "Welcome to Manavai!";
pub const WELCOME_CODE: &str = "WELCOME-GIFT";

/// Sign-up, sign-in, and profile access over an auth provider and the store.
#[derive(Clone)]
pub struct AccountService {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    inbox: Inbox,
    ledger: CreditLedger,
    admin_email: Option<String>,
}

impl AccountService {
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            inbox: Inbox::new(store.clone()),
            ledger: CreditLedger::new(store.clone()),
            auth,
            store,
            admin_email: None,
        }
    }

    pub fn with_admin_email(mut self, email: impl Into<String>) -> Self {
        self.admin_email = Some(email.into()).filter(|email: &String| !email.is_empty());
        self
    }

    pub fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }

    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    /// Creates the identity and profile, then sends the welcome message.
    pub async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AccountError> {
        let identity = self.auth.sign_up(email, password).await?;
        let user = User::new(name, identity.email.clone());

        self.store.set_as(&paths::user(&identity.uid)?, &user).await?;
        self.inbox
            .send_system_message(
                &identity.uid,
                SystemMessage::new(
                    WELCOME_TITLE,
                    format!(
                        "Welcome, {name}! Your unique Manavai ID is {}. Use this ID for support.",
                        user.id
                    ),
                )
                .with_code(WELCOME_CODE),
            )
            .await?;

        tracing::info!(
            target: "maccount::account",
            uid = identity.uid.as_str(),
            account_id = user.id.as_str(),
            "account created"
        );
        Ok(Account::new(identity.uid, user))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Account, AccountError> {
        let identity = self.auth.sign_in(email, password).await?;
        self.load_account(identity).await
    }

    pub async fn sign_out(&self) -> Result<(), AccountError> {
        self.auth.sign_out().await
    }

    /// Account for whoever the auth provider currently reports as signed in.
    pub async fn restore(&self) -> Result<Option<Account>, AccountError> {
        match self.auth.current() {
            Some(identity) => self.load_account(identity).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn current_user(&self, uid: &UserId) -> Result<Option<User>, AccountError> {
        Ok(self.store.get_as::<User>(&paths::user(uid)?).await?)
    }

    /// Live profile updates. `None` snapshots mean the record is gone.
    pub fn subscribe_user(&self, uid: &UserId) -> Result<TypedSubscription<User>, AccountError> {
        Ok(self.store.subscribe_as::<User>(&paths::user(uid)?)?)
    }

    pub fn is_admin(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .is_some_and(|admin| admin.eq_ignore_ascii_case(email.trim()))
    }

    /// Admin operations, available only to the configured admin email.
    pub fn admin_console(&self, identity: &AuthIdentity) -> Result<AdminConsole, AccountError> {
        if !self.is_admin(&identity.email) {
            tracing::warn!(
                target: "maccount::account",
                uid = identity.uid.as_str(),
                "admin console requested by non-admin"
            );
            return Err(AccountError::unauthorized("Admin access required."));
        }

        Ok(AdminConsole::new(
            self.store.clone(),
            self.inbox.clone(),
            self.ledger.clone(),
        ))
    }

    async fn load_account(&self, identity: AuthIdentity) -> Result<Account, AccountError> {
        let user = self
            .current_user(&identity.uid)
            .await?
            .ok_or_else(|| AccountError::not_found("User data not found in database"))?;
        Ok(Account::new(identity.uid, user))
    }
}
