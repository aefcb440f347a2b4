//! Chat session persistence under `chats/{uid}/{sessionId}`.

use std::sync::Arc;

use mcommon::{SessionId, UserId};
use mprovider::ChatMode;
use mstore::{DocumentPath, DocumentStore, DocumentStoreExt};
use serde_json::Value;

use crate::{ChatError, ChatSession};

#[derive(Clone)]
pub struct SessionRepository {
    store: Arc<dyn DocumentStore>,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, mode: ChatMode) -> ChatSession {
        ChatSession::new(mode)
    }

    /// Overwrites the stored session. Unset optional fields are written as `null`.
    pub async fn save(&self, uid: &UserId, session: &ChatSession) -> Result<(), ChatError> {
        let path = session_path(uid, &session.id)?;
        self.store.set_as(&path, session).await?;
        Ok(())
    }

    pub async fn load(
        &self,
        uid: &UserId,
        session_id: &SessionId,
    ) -> Result<Option<ChatSession>, ChatError> {
        Ok(self
            .store
            .get_as::<ChatSession>(&session_path(uid, session_id)?)
            .await?)
    }

    /// Every session for the user, most recent first.
    pub async fn list(&self, uid: &UserId) -> Result<Vec<ChatSession>, ChatError> {
        let Some(Value::Object(entries)) = self.store.get(&user_path(uid)?).await? else {
            return Ok(Vec::new());
        };

        let mut sessions = entries
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_value::<ChatSession>(value) {
                Ok(session) => Some(session),
                Err(error) => {
                    tracing::warn!(
                        target: "mchat::store",
                        uid = uid.as_str(),
                        session_id = key.as_str(),
                        error = %error,
                        "skipping unreadable chat session"
                    );
                    None
                }
            })
            .collect::<Vec<_>>();
        sessions.sort_by(|left, right| right.timestamp.cmp(&left.timestamp));
        Ok(sessions)
    }

    pub async fn delete(&self, uid: &UserId, session_id: &SessionId) -> Result<(), ChatError> {
        self.store.remove(&session_path(uid, session_id)?).await?;
        Ok(())
    }
}

fn user_path(uid: &UserId) -> Result<DocumentPath, ChatError> {
    Ok(DocumentPath::from_segments(["chats", uid.as_str()])?)
}

fn session_path(uid: &UserId, session_id: &SessionId) -> Result<DocumentPath, ChatError> {
    Ok(user_path(uid)?.child(session_id.as_str())?)
}
