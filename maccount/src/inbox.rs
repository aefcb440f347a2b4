//! Per-user system messages stored under `inbox/{uid}`.

use std::collections::BTreeMap;
use std::sync::Arc;

use mcommon::UserId;
use mstore::{DocumentStore, DocumentStoreExt, Subscription};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::AccountError;
use crate::paths;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxMessage {
    pub id: String,
    pub title: String,
    pub body: String,
    pub date: i64,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub code: Option<String>,
}

/// Content of a message before the inbox assigns id and date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemMessage {
    pub title: String,
    pub body: String,
    pub code: Option<String>,
}

impl SystemMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into()).filter(|code: &String| !code.is_empty());
        self
    }
}

#[derive(Clone)]
pub struct Inbox {
    store: Arc<dyn DocumentStore>,
}

impl Inbox {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Appends an unread message with a time-ordered id.
    pub async fn send_system_message(
        &self,
        uid: &UserId,
        message: SystemMessage,
    ) -> Result<InboxMessage, AccountError> {
        let path = self.store.push_key(&paths::inbox(uid)?)?;
        let stored = InboxMessage {
            id: path.last_segment().to_string(),
            title: message.title,
            body: message.body,
            date: mcommon::now_millis(),
            read: false,
            code: message.code,
        };

        self.store.set_as(&path, &stored).await?;
        tracing::debug!(
            target: "maccount::inbox",
            uid = uid.as_str(),
            message_id = stored.id.as_str(),
            "inbox message sent"
        );
        Ok(stored)
    }

    /// All messages, newest first.
    pub async fn list(&self, uid: &UserId) -> Result<Vec<InboxMessage>, AccountError> {
        let snapshot = self.store.get(&paths::inbox(uid)?).await?;
        Ok(decode_inbox(snapshot))
    }

    pub async fn mark_read(&self, uid: &UserId, message_id: &str) -> Result<(), AccountError> {
        let message = paths::inbox(uid)?.child(message_id)?;
        if self.store.get(&message).await?.is_none() {
            return Err(AccountError::not_found(format!(
                "inbox message '{message_id}' not found"
            )));
        }

        self.store.set(&message.child("read")?, json!(true)).await?;
        Ok(())
    }

    pub async fn unread_count(&self, uid: &UserId) -> Result<usize, AccountError> {
        Ok(self
            .list(uid)
            .await?
            .iter()
            .filter(|message| !message.read)
            .count())
    }

    pub fn subscribe(&self, uid: &UserId) -> Result<InboxSubscription, AccountError> {
        Ok(InboxSubscription {
            inner: self.store.subscribe(&paths::inbox(uid)?)?,
        })
    }
}

/// Live inbox view yielding the full message list, newest first, on every change.
#[derive(Debug)]
pub struct InboxSubscription {
    inner: Subscription,
}

impl InboxSubscription {
    pub async fn next(&mut self) -> Option<Vec<InboxMessage>> {
        self.inner.next().await.map(decode_inbox)
    }

    pub fn unsubscribe(self) {}
}

fn decode_inbox(snapshot: Option<Value>) -> Vec<InboxMessage> {
    let Some(Value::Object(entries)) = snapshot else {
        return Vec::new();
    };

    let mut messages = entries
        .into_iter()
        .collect::<BTreeMap<_, _>>()
        .into_values()
        .filter_map(|entry| match serde_json::from_value::<InboxMessage>(entry) {
            Ok(message) => Some(message),
            Err(error) => {
                tracing::warn!(
                    target: "maccount::inbox",
                    error = %error,
                    "skipping malformed inbox entry"
                );
                None
            }
        })
        .collect::<Vec<_>>();
    messages.sort_by(|left, right| right.date.cmp(&left.date));
    messages
}
