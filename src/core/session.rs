use crate::core::model::ChatModel;
use crate::error::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of leading turns that are always sent: the priming message and its reply.
const PINNED_TURNS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ContextPolicyKind {
    #[default]
    Unbounded,
    SlidingWindow,
    CharBudget,
}

/// Decides which part of the history goes out with each request.
///
/// The history itself is never trimmed. The priming exchange and the newest
/// turn are always sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ContextPolicy {
    #[default]
    Unbounded,
    /// Send only the most recent `turns` turns after the priming exchange.
    SlidingWindow { turns: usize },
    /// Send as many of the most recent turns as fit in `chars` characters.
    CharBudget { chars: usize },
}

impl ContextPolicy {
    pub fn select<'a>(&self, history: &'a [Turn]) -> Vec<&'a Turn> {
        let pinned = PINNED_TURNS.min(history.len());
        let (head, tail) = history.split_at(pinned);

        let keep_from = match *self {
            Self::Unbounded => 0,
            Self::SlidingWindow { turns } => tail.len().saturating_sub(turns.max(1)),
            Self::CharBudget { chars } => {
                let mut used: usize = head.iter().map(|t| t.text.chars().count()).sum();
                let mut start = tail.len();
                for (idx, turn) in tail.iter().enumerate().rev() {
                    used += turn.text.chars().count();
                    if used > chars && start < tail.len() {
                        break;
                    }
                    start = idx;
                }
                start
            }
        };

        head.iter().chain(tail[keep_from..].iter()).collect()
    }
}

/// One conversation with the model. History grows with every exchange.
pub struct Session<M> {
    model: M,
    policy: ContextPolicy,
    history: Vec<Turn>,
}

impl<M: ChatModel> Session<M> {
    pub fn new(model: M, policy: ContextPolicy) -> Self {
        Self {
            model,
            policy,
            history: Vec::new(),
        }
    }

    /// Sends one user message and records the reply.
    ///
    /// On failure the unanswered message is removed again, so the history only
    /// ever holds complete exchanges.
    pub async fn send(&mut self, message: String) -> Result<String> {
        self.history.push(Turn::user(message));

        let result = {
            let window = self.policy.select(&self.history);
            debug!(
                history = self.history.len(),
                sent = window.len(),
                "sending conversation turn"
            );
            self.model.send(&window).await
        };

        match result {
            Ok(reply) => {
                self.history.push(Turn::model(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }

    pub fn into_history(self) -> Vec<Turn> {
        self.history
    }
}
