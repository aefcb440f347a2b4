//! Gemini adapter types and conversion from the shared message model.

use crate::{Attachment, Message, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub contents: Vec<GeminiContent>,
    pub speech: Option<GeminiSpeechConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiRole {
    User,
    Model,
}

impl GeminiRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl From<Role> for GeminiRole {
    fn from(value: Role) -> Self {
        match value {
            Role::User => Self::User,
            Role::Model | Role::System => Self::Model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiPart {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
}

impl From<&Attachment> for GeminiPart {
    fn from(value: &Attachment) -> Self {
        Self::InlineData {
            mime_type: value.mime_type.clone(),
            data: value.data.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiContent {
    pub role: GeminiRole,
    pub parts: Vec<GeminiPart>,
}

impl GeminiContent {
    pub fn user(parts: Vec<GeminiPart>) -> Self {
        Self {
            role: GeminiRole::User,
            parts,
        }
    }
}

impl From<&Message> for GeminiContent {
    fn from(value: &Message) -> Self {
        Self {
            role: value.role.into(),
            parts: vec![GeminiPart::Text(value.content.clone())],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiSpeechConfig {
    pub voice: String,
}

/// Base64 payload exactly as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiInlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeminiResponse {
    pub text: String,
    pub inline_data: Vec<GeminiInlineData>,
}

impl GeminiResponse {
    /// Last inline payload rendered as a `data:` URL.
    pub fn image_data_url(&self) -> Option<String> {
        self.inline_data.last().map(|inline| {
            let mime_type = if inline.mime_type.is_empty() {
                "image/png"
            } else {
                inline.mime_type.as_str()
            };
            format!("data:{mime_type};base64,{}", inline.data)
        })
    }

    pub fn audio_base64(&self) -> Option<String> {
        self.inline_data.first().map(|inline| inline.data.clone())
    }
}
