//! Chat session, send request, and turn outcome types.

use mcommon::SessionId;
use mprovider::{Attachment, ChatMode, Message};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "New Chat";
pub const ATTACHMENT_ONLY_TITLE: &str = "New Image/File";
const TITLE_CHARS: usize = 30;

/// Credits consumed by one turn on the Free plan.
pub const TURN_COST: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: SessionId,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub timestamp: i64,
    #[serde(default)]
    pub mode: ChatMode,
}

impl ChatSession {
    pub fn new(mode: ChatMode) -> Self {
        Self {
            id: SessionId::generate(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            timestamp: mcommon::now_millis(),
            mode,
        }
    }

    /// New session titled after the first input of its first turn.
    pub fn for_first_input(mode: ChatMode, input: &str) -> Self {
        Self {
            title: title_for(input),
            ..Self::new(mode)
        }
    }

    pub fn message(&self, id: &mcommon::MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| &message.id == id)
    }

    pub(crate) fn message_mut(&mut self, id: &mcommon::MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|message| &message.id == id)
    }
}

/// First 30 characters plus `...` when longer; attachment-only turns get a fixed title.
pub fn title_for(input: &str) -> String {
    if input.is_empty() {
        return ATTACHMENT_ONLY_TITLE.to_string();
    }

    if input.chars().count() > TITLE_CHARS {
        let mut title = input.chars().take(TITLE_CHARS).collect::<String>();
        title.push_str("...");
        return title;
    }

    input.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub session: Option<ChatSession>,
    pub draft: String,
    pub attachments: Vec<Attachment>,
    pub mode: ChatMode,
}

impl SendRequest {
    pub fn new(draft: impl Into<String>, mode: ChatMode) -> Self {
        Self {
            session: None,
            draft: draft.into(),
            attachments: Vec::new(),
            mode,
        }
    }

    pub fn in_session(mut self, session: ChatSession) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyDraft,
    Busy,
    SignedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing happened.
    Rejected(RejectReason),
    /// The Free-plan balance cannot cover a turn; show the purchase flow.
    PurchaseRequired { credits: u32 },
    /// The turn ran. The session holds the final reply, which may be an error message.
    Completed(TurnSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSummary {
    pub session: ChatSession,
    pub reply_id: mcommon::MessageId,
    pub is_error: bool,
    /// Balance after the turn's deduction, when one was attempted and succeeded.
    pub credits: Option<u32>,
}

impl TurnSummary {
    pub fn reply(&self) -> Option<&Message> {
        self.session.message(&self.reply_id)
    }
}
