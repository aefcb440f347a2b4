mod provider;
mod serde_api;
mod tests;
mod transport;
mod types;

pub use provider::{GeminiProvider, MAX_SPEECH_CHARS};
pub use transport::{GeminiChunkStream, GeminiHttpTransport, GeminiTransport};
pub use types::{
    GeminiContent, GeminiInlineData, GeminiPart, GeminiRequest, GeminiResponse, GeminiRole,
    GeminiSpeechConfig,
};
