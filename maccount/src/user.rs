use mcommon::UserId;
use serde::{Deserialize, Serialize};

/// Credits granted to every new account.
pub const SIGN_UP_CREDITS: u32 = 50;

/// Length of the public account id shown to users for support.
pub const ACCOUNT_ID_LEN: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plan {
    #[default]
    Free,
    Premium,
}

/// Stored profile at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub credits: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    /// Fresh Free-plan profile with a generated public id.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: mcommon::opaque_token(ACCOUNT_ID_LEN),
            email: email.into(),
            name: name.into(),
            plan: Plan::Free,
            credits: SIGN_UP_CREDITS,
            avatar: None,
        }
    }

    pub fn is_premium(&self) -> bool {
        self.plan == Plan::Premium
    }
}

/// A signed-in identity paired with its profile as last observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub uid: UserId,
    pub user: User,
}

impl Account {
    pub fn new(uid: UserId, user: User) -> Self {
        Self { uid, user }
    }

    pub fn credits(&self) -> u32 {
        self.user.credits
    }

    pub fn plan(&self) -> Plan {
        self.user.plan
    }
}
