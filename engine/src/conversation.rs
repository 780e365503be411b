//! The conversation engine.
//!
//! A send appends the user's message at once, then runs the remote call with
//! retry on a background task. Each send takes the next sequence number and
//! finished turns are committed strictly in sequence order, so the log always
//! reads in the order the user sent, whatever order the replies arrive in.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::SystemTime;

use futures_util::FutureExt;
use futures_util::future::{AbortHandle, Abortable};
use tokio::sync::mpsc;

use orion_providers::retry::{RetryConfig, RetryOutcome, run_with_retry};
use orion_types::{Message, NonEmptyStaticStr, NonEmptyString, PersonaId};

use crate::transport::ChatTransport;

/// Stand-in text when the service answers without a usable text part.
pub const NO_RESPONSE_PLACEHOLDER: &str = NO_RESPONSE.as_str();

const NO_RESPONSE: NonEmptyStaticStr = NonEmptyStaticStr::new("No response from AI.");
const CANCELLED: NonEmptyStaticStr = NonEmptyStaticStr::new("Request cancelled.");
const CRASHED: NonEmptyStaticStr =
    NonEmptyStaticStr::new("Request failed unexpectedly. Please try again.");
const CONNECTION_ERROR: NonEmptyStaticStr =
    NonEmptyStaticStr::new("Connection error. Please check your Gemini key.");

/// Longest slice of the last error carried into the failure message.
const MAX_ERROR_DETAIL_CHARS: usize = 200;

/// `SYSTEM: <instruction>\n\nUSER: <text>`
#[must_use]
pub fn compose_prompt(persona: PersonaId, text: &str) -> String {
    format!(
        "SYSTEM: {}\n\nUSER: {}",
        persona.persona().instruction,
        text
    )
}

/// Ordered, append-only message log.
#[derive(Debug, Default, Clone)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Why a send did nothing. Never shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyInput,
    MissingKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent { seq: u64 },
    Skipped(SkipReason),
}

impl SubmitOutcome {
    #[must_use]
    pub const fn is_sent(self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// How a turn ended, reported by its background task.
#[derive(Debug)]
enum TurnResult {
    Reply(Option<String>),
    Failed { attempts: u32, error: String },
    Cancelled,
    Crashed,
}

#[derive(Debug)]
struct InFlight {
    /// Persona active when the turn was sent; the reply is tagged with it.
    persona: PersonaId,
    abort: AbortHandle,
}

pub struct ConversationEngine {
    transport: Arc<dyn ChatTransport>,
    retry: RetryConfig,
    log: ConversationLog,
    next_seq: u64,
    next_commit: u64,
    in_flight: BTreeMap<u64, InFlight>,
    finished: BTreeMap<u64, TurnResult>,
    tx: mpsc::UnboundedSender<(u64, TurnResult)>,
    rx: mpsc::UnboundedReceiver<(u64, TurnResult)>,
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("retry", &self.retry)
            .field("messages", &self.log.len())
            .field("next_seq", &self.next_seq)
            .field("next_commit", &self.next_commit)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl ConversationEngine {
    #[must_use]
    pub fn new(transport: Arc<dyn ChatTransport>, retry: RetryConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            transport,
            retry,
            log: ConversationLog::default(),
            next_seq: 0,
            next_commit: 0,
            in_flight: BTreeMap::new(),
            finished: BTreeMap::new(),
            tx,
            rx,
        }
    }

    #[must_use]
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// True while at least one send has not been committed.
    #[must_use]
    pub fn is_generating(&self) -> bool {
        !self.in_flight.is_empty()
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Send `raw` to the persona. Must be called inside a tokio runtime.
    ///
    /// Whitespace-only input or an empty key is a silent no-op. Otherwise the
    /// user message is in the log before this returns.
    pub fn submit(&mut self, raw: &str, persona: PersonaId, api_key: &str) -> SubmitOutcome {
        let Ok(text) = NonEmptyString::new(raw) else {
            return SubmitOutcome::Skipped(SkipReason::EmptyInput);
        };
        if api_key.is_empty() {
            tracing::debug!("Skipping send: no Gemini key in the vault");
            return SubmitOutcome::Skipped(SkipReason::MissingKey);
        }

        let prompt = compose_prompt(persona, text.as_str());
        self.log.push(Message::user(text, SystemTime::now()));

        let seq = self.next_seq;
        self.next_seq += 1;

        let (abort, registration) = AbortHandle::new_pair();
        self.in_flight.insert(seq, InFlight { persona, abort });

        let transport = Arc::clone(&self.transport);
        let retry = self.retry.clone();
        let api_key = api_key.to_string();
        let tx = self.tx.clone();

        let turn = async move {
            let outcome = run_with_retry(&retry, |_| transport.generate(&api_key, &prompt)).await;
            match outcome {
                RetryOutcome::Success { value, attempts } => {
                    tracing::debug!(seq, attempts, "Turn completed");
                    TurnResult::Reply(value)
                }
                RetryOutcome::Exhausted {
                    attempts,
                    last_error,
                } => TurnResult::Failed {
                    attempts,
                    error: last_error.to_string(),
                },
                RetryOutcome::NonRetryable { attempts, error } => TurnResult::Failed {
                    attempts,
                    error: error.to_string(),
                },
            }
        };

        // A panicking turn still has to fill its slot, or every later reply stalls.
        let turn = AssertUnwindSafe(turn).catch_unwind().map(move |caught| {
            caught.unwrap_or_else(|_| {
                tracing::error!(seq, "Turn task panicked");
                TurnResult::Crashed
            })
        });

        tokio::spawn(async move {
            let result = Abortable::new(turn, registration)
                .await
                .unwrap_or(TurnResult::Cancelled);
            // The receiver is gone only when the engine was dropped.
            let _ = tx.send((seq, result));
        });

        tracing::info!(seq, persona = %persona, "Sent turn");
        SubmitOutcome::Sent { seq }
    }

    /// Abort every outstanding send. Each one still commits a notice in its slot.
    pub fn cancel_all(&mut self) {
        for (seq, turn) in &self.in_flight {
            tracing::info!(seq, "Cancelling turn");
            turn.abort.abort();
        }
    }

    /// Drain finished turns without blocking and commit whatever is next in line.
    ///
    /// Returns the number of messages appended.
    pub fn poll(&mut self) -> usize {
        while let Ok((seq, result)) = self.rx.try_recv() {
            self.finished.insert(seq, result);
        }
        self.commit_ready()
    }

    /// Wait until nothing is in flight, committing as turns finish.
    ///
    /// Returns the number of messages appended.
    pub async fn settle(&mut self) -> usize {
        let mut appended = self.poll();
        while self.is_generating() {
            let Some((seq, result)) = self.rx.recv().await else {
                break;
            };
            self.finished.insert(seq, result);
            appended += self.commit_ready();
        }
        appended
    }

    fn commit_ready(&mut self) -> usize {
        let mut appended = 0;
        while let Some(result) = self.finished.remove(&self.next_commit) {
            let seq = self.next_commit;
            self.next_commit += 1;
            let Some(turn) = self.in_flight.remove(&seq) else {
                continue;
            };
            self.log.push(turn_message(turn.persona, result));
            appended += 1;
        }
        appended
    }
}

impl Drop for ConversationEngine {
    fn drop(&mut self) {
        for turn in self.in_flight.values() {
            turn.abort.abort();
        }
    }
}

fn turn_message(persona: PersonaId, result: TurnResult) -> Message {
    let now = SystemTime::now();
    match result {
        TurnResult::Reply(text) => {
            let text = text
                .and_then(|t| NonEmptyString::new(t).ok())
                .unwrap_or_else(|| NO_RESPONSE.into());
            Message::assistant(persona, text, now)
        }
        TurnResult::Failed { attempts, error } => {
            tracing::warn!(attempts, error = %error, "Turn failed");
            Message::system(failure_text(attempts, &error), now)
        }
        TurnResult::Cancelled => Message::system(CANCELLED.into(), now),
        TurnResult::Crashed => Message::system(CRASHED.into(), now),
    }
}

fn failure_text(attempts: u32, error: &str) -> NonEmptyString {
    let mut detail: String = error.chars().take(MAX_ERROR_DETAIL_CHARS).collect();
    if detail.len() < error.len() {
        detail.push_str("...");
    }
    let plural = if attempts == 1 { "" } else { "s" };
    NonEmptyString::new(format!(
        "Connection error after {attempts} attempt{plural}. Please check your Gemini key. ({detail})"
    ))
    .unwrap_or_else(|_| CONNECTION_ERROR.into())
}
