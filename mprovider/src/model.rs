//! Conversation message model shared by providers, the orchestrator, and persistence.
//!
//! ```rust
//! use mprovider::{ChatMode, Message, Role};
//!
//! let question = Message::user("What is a monad?", Vec::new());
//! let placeholder = Message::placeholder();
//!
//! assert_eq!(question.role, Role::User);
//! assert!(placeholder.is_streaming);
//! assert_eq!(ChatMode::ImageGen.as_str(), "Image-Gen");
//! ```

use std::fmt::{Display, Formatter};

use mcommon::{MessageId, now_millis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Gemini,
    OpenAi,
    Unconfigured,
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Unconfigured => "unconfigured",
        };

        f.write_str(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChatMode {
    #[default]
    Assistant,
    Code,
    #[serde(rename = "Image-Gen")]
    ImageGen,
    #[serde(rename = "Image-Edit")]
    ImageEdit,
    #[serde(rename = "File-Analyzer")]
    FileAnalyzer,
    Voice,
}

impl ChatMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assistant => "Assistant",
            Self::Code => "Code",
            Self::ImageGen => "Image-Gen",
            Self::ImageEdit => "Image-Edit",
            Self::FileAnalyzer => "File-Analyzer",
            Self::Voice => "Voice",
        }
    }
}

impl Display for ChatMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
}

/// A user-supplied file. Only the descriptor is persisted; `data` travels to
/// the provider with the request and is dropped afterwards.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub kind: AttachmentKind,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        let mime_type = mime_type.into();
        let kind = if mime_type.starts_with("image/") {
            AttachmentKind::Image
        } else {
            AttachmentKind::File
        };

        Self {
            name: name.into(),
            mime_type,
            kind,
            data,
        }
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("kind", &self.kind)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// One chat bubble. Optional fields serialize as `null` rather than being
/// omitted so overwrites clear stale values in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub timestamp: i64,
    #[serde(default)]
    pub is_streaming: bool,
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            role,
            content: content.into(),
            attachments: None,
            image_url: None,
            timestamp: now_millis(),
            is_streaming: false,
            is_error: false,
        }
    }

    pub fn user(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        let mut message = Self::new(Role::User, content);
        if !attachments.is_empty() {
            message.attachments = Some(attachments);
        }
        message
    }

    /// Empty model message that receives streamed fragments.
    pub fn placeholder() -> Self {
        let mut message = Self::new(Role::Model, "");
        message.is_streaming = true;
        message
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Whether the message is eligible to be replayed to a provider as context.
    pub fn is_replayable(&self) -> bool {
        self.role != Role::System && !self.is_error && !self.is_blank()
    }
}

/// Prior turns minus system notes, failed replies, and blank bubbles.
pub fn replayable_history(history: &[Message]) -> impl Iterator<Item = &Message> {
    history.iter().filter(|message| message.is_replayable())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub history: Vec<Message>,
    pub input: String,
    pub mode: ChatMode,
    pub attachments: Vec<Attachment>,
}

impl GenerationRequest {
    pub fn new(history: Vec<Message>, input: impl Into<String>, mode: ChatMode) -> Self {
        Self {
            history,
            input: input.into(),
            mode,
            attachments: Vec::new(),
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}
