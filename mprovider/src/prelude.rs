//! Common `mprovider` imports for downstream crates.

pub use crate::{
    Attachment, AttachmentKind, BoxedFragmentStream, ChatMode, FallbackHooks, Fragment,
    FragmentStream, GenerationRequest, Message, ModelLadder, NoopFallbackHooks, ProviderError,
    ProviderErrorKind, ProviderId, ResponseStreamer, Role, SecureCredentialManager,
    SpeechSynthesizer, UnconfiguredStreamer, VecFragmentStream,
};
pub use mcommon::{BoxFuture, MessageId};
