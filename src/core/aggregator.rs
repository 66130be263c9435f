//! Folds transcripts one by one into a single conversation and asks for a
//! cross-item synthesis at the end.
//!
//! The lifecycle is enforced by ownership: [`Aggregator::initialize`] is the
//! only constructor, [`Aggregator::inject`] needs `&mut self`, and
//! [`Aggregator::synthesize`] consumes the aggregator. Items are numbered by
//! injection order, starting at 1, and the synthesis prompt refers to them by
//! that number.

use crate::core::item::ItemId;
use crate::core::model::ChatModel;
use crate::core::session::{ContextPolicy, Session, Turn};
use crate::error::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What to do when the model call for one item fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InjectFailurePolicy {
    /// The failure is returned and the run stops.
    #[default]
    Abort,
    /// The item is logged and left out; it gets no sequence number.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framing {
    pub topic: String,
    /// Freshness wording, e.g. "in the last 24 hours".
    pub recency: String,
}

impl Framing {
    pub fn priming_prompt(&self, expected_items: usize) -> String {
        let topic = &self.topic;
        format!(
            "You are a financial analyst assistant. Your task is to analyze video transcripts \
             discussing {topic} and provide a summary of the key points, focusing on market trends, \
             recent developments, and predictions.\n\
             I will be giving you a total of around {expected_items} video transcripts, one message \
             per video, numbered in the order I send them.\n\n\
             Please remember this information while you analyze these videos. I will be asking you \
             questions about all of them afterwards."
        )
    }

    pub fn item_prompt(&self, sequence: usize, id: &ItemId, transcript: &str) -> String {
        let Self { topic, recency } = self;
        format!(
            "Here is the transcript of video number {sequence} (id {id}), a video about {topic} \
             recorded {recency}.\n\
             Again, follow what I said and remember this video's content in order to understand \
             what my next move should be:\n\n\
             {transcript}"
        )
    }

    pub fn synthesis_prompt(&self) -> String {
        let topic = &self.topic;
        format!(
            "Okay, after analyzing these videos, give me a short summary of all the videos combined \
             in 3 sentences, giving me details of what we know about {topic}.\n\n\
             Secondly, tell me for each video which move it said to do: Buy, Sell, or Hold. List \
             one line per video in the form `Video <number> - <move>`, using the numbers I gave \
             the videos.\n\n\
             Thirdly, tell me the suggested move I should make in one word, either Buy, Sell, or \
             Hold, on its own final line."
        )
    }
}

/// One transcript that made it into the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectedItem {
    /// 1-based position in injection order.
    pub sequence: usize,
    pub item_id: ItemId,
    /// The model's reply to this item's message.
    pub reply: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Primed,
    Accumulating,
}

/// The result of a completed conversation.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub text: String,
    pub items: Vec<InjectedItem>,
    /// Items whose model call failed and were left out under
    /// [`InjectFailurePolicy::Skip`].
    pub failed: Vec<ItemId>,
    pub history: Vec<Turn>,
}

impl Synthesis {
    /// The item a reply ordinal refers to.
    pub fn item_for(&self, sequence: usize) -> Option<&ItemId> {
        self.items
            .iter()
            .find(|item| item.sequence == sequence)
            .map(|item| &item.item_id)
    }
}

pub struct Aggregator<M> {
    session: Session<M>,
    framing: Framing,
    on_inject_failure: InjectFailurePolicy,
    items: Vec<InjectedItem>,
    failed: Vec<ItemId>,
}

impl<M: ChatModel> Aggregator<M> {
    /// Opens the conversation and sends the priming message.
    pub async fn initialize(
        model: M,
        framing: Framing,
        policy: ContextPolicy,
        on_inject_failure: InjectFailurePolicy,
        expected_items: usize,
    ) -> Result<Self> {
        let mut session = Session::new(model, policy);
        session.send(framing.priming_prompt(expected_items)).await?;
        info!(topic = %framing.topic, expected_items, "conversation primed");

        Ok(Self {
            session,
            framing,
            on_inject_failure,
            items: Vec::new(),
            failed: Vec::new(),
        })
    }

    pub fn phase(&self) -> Phase {
        if self.items.is_empty() {
            Phase::Primed
        } else {
            Phase::Accumulating
        }
    }

    /// Adds one transcript to the conversation.
    ///
    /// Returns the recorded item, or `Ok(None)` when the model call failed
    /// and the policy is [`InjectFailurePolicy::Skip`].
    pub async fn inject(&mut self, id: &ItemId, transcript: &str) -> Result<Option<&InjectedItem>> {
        let sequence = self.items.len() + 1;
        let prompt = self.framing.item_prompt(sequence, id, transcript);

        match self.session.send(prompt).await {
            Ok(reply) => {
                info!(item = %id, sequence, "transcript injected");
                self.items.push(InjectedItem {
                    sequence,
                    item_id: id.clone(),
                    reply,
                });
                Ok(self.items.last())
            }
            Err(e) if self.on_inject_failure == InjectFailurePolicy::Skip => {
                warn!(item = %id, error = %e, "injection failed; skipping item");
                self.failed.push(id.clone());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Sends the closing query and ends the conversation.
    pub async fn synthesize(mut self) -> Result<Synthesis> {
        if self.phase() == Phase::Primed {
            warn!("synthesizing without any injected items");
        }

        let text = self.session.send(self.framing.synthesis_prompt()).await?;
        info!(items = self.items.len(), "synthesis received");

        Ok(Synthesis {
            text,
            items: self.items,
            failed: self.failed,
            history: self.session.into_history(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::testing::ScriptedModel;
    use crate::core::session::Speaker;
    use crate::error::Error;

    fn framing() -> Framing {
        Framing {
            topic: "xrp".into(),
            recency: "in the last 24 hours".into(),
        }
    }

    fn id(raw: &str) -> ItemId {
        ItemId::parse(raw).expect("valid id")
    }

    async fn start(model: &ScriptedModel, policy: InjectFailurePolicy) -> Result<Aggregator<&ScriptedModel>> {
        Aggregator::initialize(model, framing(), ContextPolicy::Unbounded, policy, 3).await
    }

    #[tokio::test]
    async fn runs_the_three_phase_protocol_in_order() {
        let model = ScriptedModel::new()
            .reply("ready")
            .reply("got one")
            .reply("got two")
            .reply("Video 1 - Buy\nVideo 2 - Hold\nBuy");

        let mut aggregator = start(&model, InjectFailurePolicy::Abort).await.expect("prime");
        assert_eq!(aggregator.phase(), Phase::Primed);

        aggregator.inject(&id("aaa"), "first transcript").await.expect("inject");
        assert_eq!(aggregator.phase(), Phase::Accumulating);
        aggregator.inject(&id("bbb"), "second transcript").await.expect("inject");

        let synthesis = aggregator.synthesize().await.expect("synthesize");

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 4);
        assert!(prompts[0].contains("around 3 video transcripts"));
        assert!(prompts[1].contains("video number 1 (id aaa)"));
        assert!(prompts[1].ends_with("first transcript"));
        assert!(prompts[2].contains("video number 2 (id bbb)"));
        assert!(prompts[2].contains("in the last 24 hours"));
        assert!(prompts[3].contains("Buy, Sell, or Hold"));

        assert_eq!(synthesis.text, "Video 1 - Buy\nVideo 2 - Hold\nBuy");
        assert_eq!(synthesis.item_for(1), Some(&id("aaa")));
        assert_eq!(synthesis.item_for(2), Some(&id("bbb")));
        assert_eq!(synthesis.items[0].reply, "got one");
    }

    #[tokio::test]
    async fn every_request_carries_the_whole_history() {
        let model = ScriptedModel::new();
        let mut aggregator = start(&model, InjectFailurePolicy::Abort).await.expect("prime");
        aggregator.inject(&id("aaa"), "one").await.expect("inject");
        aggregator.inject(&id("bbb"), "two").await.expect("inject");
        let synthesis = aggregator.synthesize().await.expect("synthesize");

        let sizes: Vec<usize> = model.requests.borrow().iter().map(Vec::len).collect();
        assert_eq!(sizes, [1, 3, 5, 7]);
        assert_eq!(synthesis.history.len(), 8);
        assert_eq!(synthesis.history[7].speaker, Speaker::Model);
    }

    #[tokio::test]
    async fn synthesis_without_items_is_degenerate_not_fatal() {
        let model = ScriptedModel::new()
            .reply("ready")
            .reply("No videos were provided, so there is nothing to recommend.");
        let aggregator = start(&model, InjectFailurePolicy::Abort).await.expect("prime");
        let synthesis = aggregator.synthesize().await.expect("synthesize");

        assert!(synthesis.items.is_empty());
        assert_eq!(synthesis.item_for(1), None);
        assert_eq!(model.prompts().len(), 2);
    }

    #[tokio::test]
    async fn priming_failure_is_fatal() {
        let model = ScriptedModel::new().fail("service down");
        let result = start(&model, InjectFailurePolicy::Skip).await;
        assert!(matches!(result, Err(Error::Model(_))));
    }

    #[tokio::test]
    async fn injection_failure_aborts_by_default() {
        let model = ScriptedModel::new().reply("ready").fail("context too long");
        let mut aggregator = start(&model, InjectFailurePolicy::Abort).await.expect("prime");
        let result = aggregator.inject(&id("aaa"), "text").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn skipped_injection_keeps_numbering_dense() {
        let model = ScriptedModel::new()
            .reply("ready")
            .reply("first ok")
            .fail("transient")
            .reply("third ok")
            .reply("summary");

        let mut aggregator = start(&model, InjectFailurePolicy::Skip).await.expect("prime");
        aggregator.inject(&id("aaa"), "one").await.expect("inject");
        let skipped = aggregator.inject(&id("bbb"), "two").await.expect("inject");
        assert!(skipped.is_none());
        aggregator.inject(&id("ccc"), "three").await.expect("inject");
        let synthesis = aggregator.synthesize().await.expect("synthesize");

        assert_eq!(synthesis.item_for(1), Some(&id("aaa")));
        assert_eq!(synthesis.item_for(2), Some(&id("ccc")));
        assert_eq!(synthesis.failed, [id("bbb")]);
        assert!(model.prompts()[3].contains("video number 2 (id ccc)"));
        // the failed message never reaches the history
        assert!(synthesis.history.iter().all(|turn| !turn.text.ends_with("two")));
    }
}
