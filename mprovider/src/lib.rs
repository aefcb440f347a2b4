//! Streaming generation adapters: the fragment contract, Gemini and OpenAI
//! providers, the model fallback ladder, credentials, and speech synthesis.
//!
//! ```rust
//! use mprovider::{ChatMode, GenerationRequest, Message, ResponseStreamer, UnconfiguredStreamer};
//!
//! let request = GenerationRequest::new(
//!     vec![Message::new(mprovider::Role::User, "hello")],
//!     "and again",
//!     ChatMode::Assistant,
//! );
//! let streamer = UnconfiguredStreamer;
//! let _pending = streamer.stream_response(request);
//! ```

pub mod adapters;
pub mod credentials;
pub mod error;
pub mod fallback;
pub mod model;
pub mod prelude;
pub mod prompts;
pub mod provider;
#[cfg(any(feature = "provider-gemini", feature = "provider-openai"))]
mod sse;
pub mod stream;

pub use credentials::{SecretString, SecureCredentialManager};
pub use error::{ProviderError, ProviderErrorKind};
pub use fallback::{
    FallbackHooks, LadderCommit, LadderFailure, ModelLadder, NoopFallbackHooks, open_committed,
};
pub use mcommon::{BoxFuture, MessageId};
pub use model::{
    Attachment, AttachmentKind, ChatMode, GenerationRequest, Message, ProviderId, Role,
    replayable_history,
};
pub use prompts::system_instruction;
pub use provider::{ProviderFuture, ResponseStreamer, SpeechSynthesizer, UnconfiguredStreamer};
pub use stream::{BoxedFragmentStream, Fragment, FragmentStream, VecFragmentStream};
