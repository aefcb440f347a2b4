use std::sync::{Arc, Mutex};

use maccount::{Account, AccountErrorKind, CreditLedger, Plan, User};
use mchat::{
    ChatRuntimeHooks, ChatService, ChatSession, RejectReason, SendOutcome, SendRequest,
    TurnSummary,
};
use mcommon::{SessionId, UserId};
use mprovider::{
    Attachment, BoxedFragmentStream, ChatMode, Fragment, GenerationRequest, ProviderError,
    ProviderFuture, ProviderId, ResponseStreamer, SpeechSynthesizer, VecFragmentStream,
};
use mstore::{DocumentPath, DocumentStore, DocumentStoreExt, InMemoryDocumentStore};
use tokio::sync::Notify;

enum Script {
    Fragments(Vec<Fragment>),
    Refuse(ProviderError),
}

struct FakeStreamer {
    script: Script,
    gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl FakeStreamer {
    fn fragments(fragments: Vec<Fragment>) -> Self {
        Self {
            script: Script::Fragments(fragments),
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn refusing(error: ProviderError) -> Self {
        Self {
            script: Script::Refuse(error),
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl ResponseStreamer for FakeStreamer {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn stream_response<'a>(
        &'a self,
        request: GenerationRequest,
    ) -> ProviderFuture<'a, Result<BoxedFragmentStream<'a>, ProviderError>> {
        Box::pin(async move {
            self.calls.lock().expect("calls lock").push(request);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            match &self.script {
                Script::Fragments(fragments) => {
                    Ok(Box::pin(VecFragmentStream::new(fragments.clone()))
                        as BoxedFragmentStream<'a>)
                }
                Script::Refuse(error) => Err(error.clone()),
            }
        })
    }
}

struct FixedSpeech(Result<Option<String>, ProviderError>);

impl SpeechSynthesizer for FixedSpeech {
    fn synthesize<'a>(
        &'a self,
        _text: &'a str,
    ) -> ProviderFuture<'a, Result<Option<String>, ProviderError>> {
        let result = self.0.clone();
        Box::pin(async move { result })
    }
}

#[derive(Default)]
struct RecordingHooks {
    events: Mutex<Vec<String>>,
}

impl ChatRuntimeHooks for RecordingHooks {
    fn on_turn_rejected(&self, reason: RejectReason) {
        self.push(format!("rejected:{reason:?}"));
    }

    fn on_purchase_required(&self, _uid: &UserId, credits: u32) {
        self.push(format!("purchase:{credits}"));
    }

    fn on_credits_deducted(&self, _uid: &UserId, amount: u32, remaining: u32) {
        self.push(format!("deducted:{amount}:{remaining}"));
    }

    fn on_turn_success(
        &self,
        _session_id: &SessionId,
        _provider: ProviderId,
        fragments: u32,
        _elapsed: std::time::Duration,
    ) {
        self.push(format!("success:{fragments}"));
    }

    fn on_turn_failure(
        &self,
        _session_id: &SessionId,
        _provider: ProviderId,
        message: &str,
        _elapsed: std::time::Duration,
    ) {
        self.push(format!("failure:{message}"));
    }
}

impl RecordingHooks {
    fn push(&self, event: String) {
        self.events.lock().expect("events lock").push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }
}

async fn account(store: &Arc<InMemoryDocumentStore>, plan: Plan, credits: u32) -> Account {
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
    Account::new(UserId::from("uid-1"), user)
}

fn completed(outcome: SendOutcome) -> TurnSummary {
    match outcome {
        SendOutcome::Completed(summary) => summary,
        other => panic!("turn should complete, got {other:?}"),
    }
}

fn ignore(_: &ChatSession) {}

#[tokio::test]
async fn free_user_without_enough_credits_is_sent_to_purchase() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let streamer = Arc::new(FakeStreamer::fragments(vec![Fragment::done()]));
    let hooks = Arc::new(RecordingHooks::default());
    let service = ChatService::builder(streamer.clone(), store.clone())
        .hooks(hooks.clone())
        .build();
    let account = account(&store, Plan::Free, 2).await;

    let outcome = service
        .send_message(SendRequest::new("hello", ChatMode::Assistant), Some(&account), &ignore)
        .await;

    assert_eq!(outcome, SendOutcome::PurchaseRequired { credits: 2 });
    assert!(streamer.calls().is_empty());
    assert_eq!(
        CreditLedger::new(store.clone()).balance(&account.uid).await.expect("balance"),
        2
    );
    assert!(service.sessions().list(&account.uid).await.expect("list").is_empty());
    assert_eq!(hooks.events(), vec!["purchase:2".to_string()]);
}

#[tokio::test]
async fn free_turn_deducts_streams_and_persists() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let streamer = Arc::new(FakeStreamer::fragments(vec![
        Fragment::text("Here is "),
        Fragment::text("your fox").with_image_url(Some("data:image/png;base64,AAAA".into())),
        Fragment::text("."),
        Fragment::done(),
    ]));
    let hooks = Arc::new(RecordingHooks::default());
    let service = ChatService::builder(streamer.clone(), store.clone())
        .hooks(hooks.clone())
        .build();
    let account = account(&store, Plan::Free, 50).await;

    let request = SendRequest::new("Draw a small red fox sitting in the snow at dusk", ChatMode::ImageGen)
        .with_attachments(vec![Attachment::new("ref.png", "image/png", vec![9, 9])]);
    let summary = completed(
        service
            .send_message(request, Some(&account), &ignore)
            .await,
    );

    assert!(!summary.is_error);
    assert_eq!(summary.credits, Some(47));
    assert_eq!(summary.session.title, "Draw a small red fox sitting i...");
    assert_eq!(summary.session.mode, ChatMode::ImageGen);

    let reply = summary.reply().expect("reply");
    assert_eq!(reply.content, "Here is your fox.");
    assert_eq!(reply.image_url.as_deref(), Some("data:image/png;base64,AAAA"));
    assert!(!reply.is_streaming);

    let sent = &streamer.calls()[0];
    assert!(sent.history.is_empty());
    assert_eq!(sent.attachments[0].data, vec![9, 9]);

    let stored = service
        .sessions()
        .load(&account.uid, &summary.session.id)
        .await
        .expect("load")
        .expect("session persisted");
    assert_eq!(stored.messages.len(), 2);
    assert_eq!(stored.messages[1].content, "Here is your fox.");
    assert!(!stored.messages[1].is_streaming);
    assert_eq!(
        CreditLedger::new(store).balance(&account.uid).await.expect("balance"),
        47
    );
    assert_eq!(
        hooks.events(),
        vec!["deducted:3:47".to_string(), "success:4".to_string()]
    );
}

#[tokio::test]
async fn attachment_only_turns_get_the_file_title() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let service = ChatService::new(
        Arc::new(FakeStreamer::fragments(vec![Fragment::text("A PDF.").finished()])),
        store.clone(),
    );
    let account = account(&store, Plan::Premium, 0).await;

    let request = SendRequest::new("", ChatMode::FileAnalyzer).with_attachments(vec![
        Attachment::new("report.pdf", "application/pdf", vec![1]),
    ]);
    let summary = completed(service.send_message(request, Some(&account), &ignore).await);

    assert_eq!(summary.session.title, "New Image/File");
    let user_message = &summary.session.messages[0];
    assert_eq!(user_message.attachments.as_ref().map(Vec::len), Some(1));
}

#[tokio::test]
async fn refused_generation_becomes_an_error_reply_after_deduction() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let service = ChatService::new(
        Arc::new(FakeStreamer::refusing(ProviderError::unavailable(
            "No AI Service configured.",
        ))),
        store.clone(),
    );
    let account = account(&store, Plan::Free, 10).await;

    let summary = completed(
        service
            .send_message(SendRequest::new("hello", ChatMode::Assistant), Some(&account), &ignore)
            .await,
    );

    let reply = summary.reply().expect("reply");
    assert!(summary.is_error);
    assert!(reply.is_error);
    assert!(!reply.is_streaming);
    assert_eq!(reply.content, "**Error:** No AI Service configured.");
    assert_eq!(summary.credits, Some(7));

    let stored = service
        .sessions()
        .load(&account.uid, &summary.session.id)
        .await
        .expect("load")
        .expect("stored");
    assert!(stored.messages[1].is_error);
}

#[tokio::test]
async fn failed_deduction_aborts_before_generation() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let streamer = Arc::new(FakeStreamer::fragments(vec![Fragment::done()]));
    let service = ChatService::new(streamer.clone(), store.clone());
    let account = account(&store, Plan::Free, 5).await;

    // Another device spent the balance after this account snapshot was taken.
    let ledger = CreditLedger::new(store.clone());
    ledger
        .deduct(&account.uid, 5, Plan::Free, 4)
        .await
        .expect("concurrent spend");

    let summary = completed(
        service
            .send_message(SendRequest::new("hello", ChatMode::Assistant), Some(&account), &ignore)
            .await,
    );

    assert!(streamer.calls().is_empty());
    assert_eq!(summary.credits, None);
    assert_eq!(
        summary.reply().map(|reply| reply.content.as_str()),
        Some("**Error:** Insufficient credits")
    );
    assert_eq!(ledger.balance(&account.uid).await.expect("balance"), 1);

    let error = ledger
        .deduct(&account.uid, 1, Plan::Free, 3)
        .await
        .expect_err("still insufficient");
    assert_eq!(error.kind, AccountErrorKind::InsufficientCredits);
}

#[tokio::test]
async fn in_band_error_fragment_marks_the_reply() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let service = ChatService::new(
        Arc::new(FakeStreamer::fragments(vec![
            Fragment::text("Partial"),
            Fragment::error("\n\n**Quota exceeded.**"),
        ])),
        store.clone(),
    );
    let account = account(&store, Plan::Premium, 0).await;

    let summary = completed(
        service
            .send_message(SendRequest::new("hello", ChatMode::Assistant), Some(&account), &ignore)
            .await,
    );

    let reply = summary.reply().expect("reply");
    assert!(summary.is_error);
    assert!(reply.is_error);
    assert!(!reply.is_streaming);
    assert_eq!(reply.content, "Partial\n\n**Quota exceeded.**");
}

#[tokio::test]
async fn streams_without_a_terminal_fragment_are_finalized() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let service = ChatService::new(
        Arc::new(FakeStreamer::fragments(vec![Fragment::text("cut short")])),
        store.clone(),
    );
    let account = account(&store, Plan::Premium, 0).await;

    let summary = completed(
        service
            .send_message(SendRequest::new("hello", ChatMode::Assistant), Some(&account), &ignore)
            .await,
    );

    let stored = service
        .sessions()
        .load(&account.uid, &summary.session.id)
        .await
        .expect("load")
        .expect("stored");
    assert!(!stored.messages[1].is_streaming);
    assert!(!stored.messages[1].is_error);
    assert_eq!(stored.messages[1].content, "cut short");
}

#[tokio::test]
async fn second_send_while_generating_is_rejected() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let gate = Arc::new(Notify::new());
    let streamer = Arc::new(
        FakeStreamer::fragments(vec![Fragment::text("done").finished()]).gated(gate.clone()),
    );
    let service = Arc::new(ChatService::new(streamer.clone(), store.clone()));
    let account = account(&store, Plan::Free, 50).await;

    let first = {
        let service = service.clone();
        let account = account.clone();
        tokio::spawn(async move {
            service
                .send_message(
                    SendRequest::new("first", ChatMode::Assistant),
                    Some(&account),
                    &ignore,
                )
                .await
        })
    };

    while streamer.calls().is_empty() {
        tokio::task::yield_now().await;
    }
    assert!(service.is_generating());

    let second = service
        .send_message(SendRequest::new("second", ChatMode::Assistant), Some(&account), &ignore)
        .await;
    assert_eq!(second, SendOutcome::Rejected(RejectReason::Busy));

    gate.notify_one();
    let first = completed(first.await.expect("first turn task"));
    assert_eq!(first.credits, Some(47));
    assert!(!service.is_generating());
}

#[tokio::test]
async fn read_aloud_swallows_synthesis_failures() {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    let streamer = Arc::new(FakeStreamer::fragments(Vec::new()));

    let silent = ChatService::new(streamer.clone(), store.clone());
    assert_eq!(silent.read_aloud("hello").await, None);

    let speaking = ChatService::builder(streamer.clone(), store.clone())
        .speech(Arc::new(FixedSpeech(Ok(Some("UklGRg==".to_string())))))
        .build();
    assert_eq!(speaking.read_aloud("hello").await.as_deref(), Some("UklGRg=="));

    let failing = ChatService::builder(streamer, store)
        .speech(Arc::new(FixedSpeech(Err(ProviderError::transport("reset")))))
        .build();
    assert_eq!(failing.read_aloud("hello").await, None);
}
