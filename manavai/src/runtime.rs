//! Runtime wiring: store, accounts, providers, and chat in one bundle.

use std::sync::Arc;

use maccount::purchase::PaymentConfig;
use maccount::{AccountService, AuthProvider, InMemoryAuthProvider};
use mchat::{ChatRuntimeHooks, ChatService};
use mobserve::{SafeChatHooks, SafeFallbackHooks, TracingObservabilityHooks};
use mprovider::FallbackHooks;
use mstore::{DocumentStore, create_document_store};

use crate::{AppConfig, ManavaiError, ProviderStack, build_providers};

#[derive(Clone)]
pub struct RuntimeBundle {
    pub store: Arc<dyn DocumentStore>,
    pub accounts: AccountService,
    pub chat: Arc<ChatService>,
    pub payment: PaymentConfig,
}

/// Default observability: panic-isolated tracing hooks.
pub fn tracing_fallback_hooks() -> Arc<dyn FallbackHooks> {
    Arc::new(SafeFallbackHooks::new(TracingObservabilityHooks))
}

pub fn tracing_chat_hooks() -> Arc<dyn ChatRuntimeHooks> {
    Arc::new(SafeChatHooks::new(TracingObservabilityHooks))
}

/// Builds the runtime described by `config` with the development auth provider.
pub fn build_runtime(config: AppConfig) -> Result<RuntimeBundle, ManavaiError> {
    let store = create_document_store(config.store.clone())?;
    build_runtime_with(config, Arc::new(InMemoryAuthProvider::new()), store)
}

pub fn build_runtime_with(
    config: AppConfig,
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
) -> Result<RuntimeBundle, ManavaiError> {
    let providers = build_providers(&config, tracing_fallback_hooks())?;
    Ok(build_runtime_with_providers(
        config,
        auth,
        store,
        providers,
        tracing_chat_hooks(),
    ))
}

pub fn build_runtime_with_providers(
    config: AppConfig,
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    providers: ProviderStack,
    hooks: Arc<dyn ChatRuntimeHooks>,
) -> RuntimeBundle {
    let mut accounts = AccountService::new(auth, Arc::clone(&store));
    if let Some(admin_email) = &config.admin_email {
        accounts = accounts.with_admin_email(admin_email.clone());
    }

    let mut chat = ChatService::builder(providers.streamer, Arc::clone(&store)).hooks(hooks);
    if let Some(speech) = providers.speech {
        chat = chat.speech(speech);
    }

    RuntimeBundle {
        store,
        accounts,
        chat: Arc::new(chat.build()),
        payment: config.payment,
    }
}
