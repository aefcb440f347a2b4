//! Turn orchestration: admission, credit deduction, streaming, and persistence.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures_util::StreamExt;
use maccount::{Account, CreditLedger};
use mcommon::{MessageId, UserId};
use mprovider::{
    GenerationRequest, Message, ProviderId, ResponseStreamer, SpeechSynthesizer,
};
use mstore::DocumentStore;

use crate::{
    ChatRuntimeHooks, ChatSession, NoopChatRuntimeHooks, RejectReason, SendOutcome, SendRequest,
    SessionRepository, TURN_COST, TurnSummary,
};

/// Receives every intermediate session snapshot of a turn, ahead of persistence.
pub trait TurnObserver: Send + Sync {
    fn publish(&self, session: &ChatSession);
}

impl<F> TurnObserver for F
where
    F: Fn(&ChatSession) + Send + Sync,
{
    fn publish(&self, session: &ChatSession) {
        self(session)
    }
}

pub struct ChatService {
    streamer: Arc<dyn ResponseStreamer>,
    sessions: SessionRepository,
    ledger: CreditLedger,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    hooks: Arc<dyn ChatRuntimeHooks>,
    in_flight: AtomicBool,
}

pub struct ChatServiceBuilder {
    streamer: Arc<dyn ResponseStreamer>,
    store: Arc<dyn DocumentStore>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    hooks: Arc<dyn ChatRuntimeHooks>,
}

impl ChatServiceBuilder {
    pub fn speech(mut self, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn ChatRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> ChatService {
        ChatService {
            streamer: self.streamer,
            sessions: SessionRepository::new(self.store.clone()),
            ledger: CreditLedger::new(self.store),
            speech: self.speech,
            hooks: self.hooks,
            in_flight: AtomicBool::new(false),
        }
    }
}

impl ChatService {
    pub fn new(streamer: Arc<dyn ResponseStreamer>, store: Arc<dyn DocumentStore>) -> Self {
        Self::builder(streamer, store).build()
    }

    pub fn builder(
        streamer: Arc<dyn ResponseStreamer>,
        store: Arc<dyn DocumentStore>,
    ) -> ChatServiceBuilder {
        ChatServiceBuilder {
            streamer,
            store,
            speech: None,
            hooks: Arc::new(NoopChatRuntimeHooks),
        }
    }

    pub fn sessions(&self) -> &SessionRepository {
        &self.sessions
    }

    pub fn provider(&self) -> ProviderId {
        self.streamer.id()
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs one chat turn.
    ///
    /// Generation failures never surface as `Err`; they end up in the reply
    /// message with `is_error` set. Store write failures are logged and skipped.
    pub async fn send_message(
        &self,
        request: SendRequest,
        account: Option<&Account>,
        observer: &dyn TurnObserver,
    ) -> SendOutcome {
        if request.draft.trim().is_empty() && request.attachments.is_empty() {
            return self.reject(RejectReason::EmptyDraft);
        }

        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            return self.reject(RejectReason::Busy);
        };

        let Some(account) = account else {
            return self.reject(RejectReason::SignedOut);
        };

        let premium = account.user.is_premium();
        if !premium && account.credits() < TURN_COST {
            self.hooks.on_purchase_required(&account.uid, account.credits());
            return SendOutcome::PurchaseRequired {
                credits: account.credits(),
            };
        }

        let started_at = Instant::now();
        let SendRequest {
            session,
            draft,
            attachments,
            mode,
        } = request;

        let mut session = session.unwrap_or_else(|| ChatSession::for_first_input(mode, &draft));
        let history = session.messages.clone();
        let placeholder = Message::placeholder();
        let reply_id = placeholder.id.clone();

        session.messages.push(Message::user(draft.clone(), attachments.clone()));
        session.messages.push(placeholder);
        session.timestamp = mcommon::now_millis();
        self.hooks.on_turn_start(&account.uid, &session.id, mode);

        observer.publish(&session);
        self.persist(&account.uid, &session).await;

        let mut credits = None;
        if !premium {
            match self
                .ledger
                .deduct(&account.uid, account.credits(), account.plan(), TURN_COST)
                .await
            {
                Ok(remaining) => {
                    self.hooks
                        .on_credits_deducted(&account.uid, TURN_COST, remaining);
                    credits = Some(remaining);
                }
                Err(error) => {
                    return self
                        .fail_turn(
                            &account.uid,
                            session,
                            reply_id,
                            &error.message,
                            credits,
                            started_at,
                            observer,
                        )
                        .await;
                }
            }
        }

        let generation = GenerationRequest::new(history, draft, mode).with_attachments(attachments);
        let mut stream = match self.streamer.stream_response(generation).await {
            Ok(stream) => stream,
            Err(error) => {
                return self
                    .fail_turn(
                        &account.uid,
                        session,
                        reply_id,
                        &error.message,
                        credits,
                        started_at,
                        observer,
                    )
                    .await;
            }
        };

        let mut fragments = 0_u32;
        let mut is_error = false;
        while let Some(fragment) = stream.next().await {
            fragments += 1;
            let Some(reply) = session.message_mut(&reply_id) else {
                break;
            };

            reply.content.push_str(&fragment.text);
            if let Some(image_url) = fragment.image_url.filter(|url| !url.is_empty()) {
                reply.image_url = Some(image_url);
            }
            reply.is_streaming = !fragment.is_done;
            if fragment.is_error {
                reply.is_error = true;
                is_error = true;
            }

            observer.publish(&session);
            if fragment.is_done {
                break;
            }
        }
        drop(stream);

        let unfinished = session
            .message(&reply_id)
            .is_some_and(|reply| reply.is_streaming);
        if unfinished {
            tracing::debug!(
                target: "mchat::service",
                session_id = session.id.as_str(),
                "stream ended without a terminal fragment"
            );
            if let Some(reply) = session.message_mut(&reply_id) {
                reply.is_streaming = false;
            }
            observer.publish(&session);
        }

        let elapsed = started_at.elapsed();
        if is_error {
            let message = session
                .message(&reply_id)
                .map(|reply| reply.content.clone())
                .unwrap_or_default();
            self.hooks
                .on_turn_failure(&session.id, self.streamer.id(), &message, elapsed);
        } else {
            self.hooks
                .on_turn_success(&session.id, self.streamer.id(), fragments, elapsed);
        }

        self.persist(&account.uid, &session).await;
        SendOutcome::Completed(TurnSummary {
            session,
            reply_id,
            is_error,
            credits,
        })
    }

    /// Synthesizes speech for a reply. Any failure reads as "no audio".
    pub async fn read_aloud(&self, text: &str) -> Option<String> {
        let speech = self.speech.as_ref()?;
        match speech.synthesize(text).await {
            Ok(audio) => audio,
            Err(error) => {
                tracing::warn!(
                    target: "mchat::service",
                    error = %error,
                    "speech synthesis failed"
                );
                None
            }
        }
    }

    fn reject(&self, reason: RejectReason) -> SendOutcome {
        self.hooks.on_turn_rejected(reason);
        SendOutcome::Rejected(reason)
    }

    #[allow(clippy::too_many_arguments)]
    async fn fail_turn(
        &self,
        uid: &UserId,
        mut session: ChatSession,
        reply_id: MessageId,
        message: &str,
        credits: Option<u32>,
        started_at: Instant,
        observer: &dyn TurnObserver,
    ) -> SendOutcome {
        if let Some(reply) = session.message_mut(&reply_id) {
            reply.content = format!("**Error:** {message}");
            reply.is_streaming = false;
            reply.is_error = true;
        }

        self.hooks
            .on_turn_failure(&session.id, self.streamer.id(), message, started_at.elapsed());
        observer.publish(&session);
        self.persist(uid, &session).await;

        SendOutcome::Completed(TurnSummary {
            session,
            reply_id,
            is_error: true,
            credits,
        })
    }

    async fn persist(&self, uid: &UserId, session: &ChatSession) {
        if let Err(error) = self.sessions.save(uid, session).await {
            tracing::error!(
                target: "mchat::service",
                uid = uid.as_str(),
                session_id = session.id.as_str(),
                error = %error,
                "failed to save chat session"
            );
            self.hooks.on_persist_failure(&session.id, &error.message);
        }
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use maccount::{Plan, User};
    use mprovider::{
        BoxedFragmentStream, ChatMode, Fragment, ProviderError, ProviderFuture, Role,
        VecFragmentStream,
    };
    use mstore::{DocumentPath, DocumentStoreExt, InMemoryDocumentStore};

    use super::*;

    struct ScriptedStreamer {
        fragments: Vec<Fragment>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedStreamer {
        fn new(fragments: Vec<Fragment>) -> Self {
            Self {
                fragments,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().expect("requests lock").clone()
        }
    }

    impl ResponseStreamer for ScriptedStreamer {
        fn id(&self) -> ProviderId {
            ProviderId::Gemini
        }

        fn stream_response<'a>(
            &'a self,
            request: GenerationRequest,
        ) -> ProviderFuture<'a, Result<BoxedFragmentStream<'a>, ProviderError>> {
            Box::pin(async move {
                self.requests.lock().expect("requests lock").push(request);
                Ok(Box::pin(VecFragmentStream::new(self.fragments.clone()))
                    as BoxedFragmentStream<'a>)
            })
        }
    }

    async fn seeded_account(store: &Arc<InMemoryDocumentStore>, plan: Plan, credits: u32) -> Account {
        let uid = UserId::from("uid-1");
        let mut user = User::new("Asha", "asha@example.com");
        user.plan = plan;
        user.credits = credits;
        store
            .set_as(
                &DocumentPath::from_segments(["users", "uid-1"]).expect("path"),
                &user,
            )
            .await
            .expect("seed user");
        Account::new(uid, user)
    }

    fn ignore(_: &ChatSession) {}

    #[tokio::test]
    async fn blank_drafts_are_rejected_without_side_effects() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let streamer = Arc::new(ScriptedStreamer::new(vec![Fragment::done()]));
        let service = ChatService::new(streamer.clone(), store.clone());
        let account = seeded_account(&store, Plan::Free, 50).await;

        let outcome = service
            .send_message(SendRequest::new("   ", ChatMode::Assistant), Some(&account), &ignore)
            .await;

        assert_eq!(outcome, SendOutcome::Rejected(RejectReason::EmptyDraft));
        assert!(streamer.requests().is_empty());
        assert!(!service.is_generating());
    }

    #[tokio::test]
    async fn signed_out_sends_are_rejected_and_release_the_flag() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = ChatService::new(Arc::new(ScriptedStreamer::new(Vec::new())), store);

        let outcome = service
            .send_message(SendRequest::new("hi", ChatMode::Assistant), None, &ignore)
            .await;

        assert_eq!(outcome, SendOutcome::Rejected(RejectReason::SignedOut));
        assert!(!service.is_generating());
    }

    #[tokio::test]
    async fn premium_turns_skip_the_ledger() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let streamer = Arc::new(ScriptedStreamer::new(vec![
            Fragment::text("Hi"),
            Fragment::text(" there").finished(),
        ]));
        let service = ChatService::new(streamer.clone(), store.clone());
        let account = seeded_account(&store, Plan::Premium, 0).await;

        let outcome = service
            .send_message(SendRequest::new("hello", ChatMode::Code), Some(&account), &ignore)
            .await;

        let SendOutcome::Completed(summary) = outcome else {
            panic!("premium turn should run");
        };
        assert_eq!(summary.credits, None);
        assert_eq!(summary.reply().map(|reply| reply.content.as_str()), Some("Hi there"));
        assert_eq!(
            CreditLedger::new(store).balance(&account.uid).await.expect("balance"),
            0
        );
        assert_eq!(streamer.requests()[0].mode, ChatMode::Code);
    }

    #[tokio::test]
    async fn history_excludes_the_current_turn() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let streamer = Arc::new(ScriptedStreamer::new(vec![Fragment::text("ok").finished()]));
        let service = ChatService::new(streamer.clone(), store.clone());
        let account = seeded_account(&store, Plan::Premium, 0).await;

        let mut session = ChatSession::new(ChatMode::Assistant);
        session.messages.push(Message::new(Role::User, "first"));
        session.messages.push(Message::new(Role::Model, "answer"));

        service
            .send_message(
                SendRequest::new("second", ChatMode::Assistant).in_session(session),
                Some(&account),
                &ignore,
            )
            .await;

        let sent = &streamer.requests()[0];
        assert_eq!(sent.input, "second");
        assert_eq!(
            sent.history
                .iter()
                .map(|message| message.content.as_str())
                .collect::<Vec<_>>(),
            vec!["first", "answer"]
        );
    }

    #[tokio::test]
    async fn observer_sees_placeholder_before_fragments() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let streamer = Arc::new(ScriptedStreamer::new(vec![
            Fragment::text("a"),
            Fragment::text("b"),
            Fragment::done(),
        ]));
        let service = ChatService::new(streamer, store.clone());
        let account = seeded_account(&store, Plan::Free, 10).await;

        let snapshots = Mutex::new(Vec::<(String, bool)>::new());
        let observer = |session: &ChatSession| {
            let reply = session.messages.last().expect("reply present");
            snapshots
                .lock()
                .expect("snapshots lock")
                .push((reply.content.clone(), reply.is_streaming));
        };

        service
            .send_message(SendRequest::new("go", ChatMode::Assistant), Some(&account), &observer)
            .await;

        let snapshots = snapshots.into_inner().expect("snapshots");
        assert_eq!(
            snapshots,
            vec![
                (String::new(), true),
                ("a".to_string(), true),
                ("ab".to_string(), true),
                ("ab".to_string(), false),
            ]
        );
    }
}
