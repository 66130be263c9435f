use crate::core::aggregator::{Aggregator, Framing, InjectedItem};
use crate::core::config::Settings;
use crate::core::discovery::Discovery;
use crate::core::item::{ItemId, TranscriptSet};
use crate::core::model::ChatModel;
use crate::core::session::Turn;
use crate::core::transcript::TranscriptSource;
use crate::core::verdict::{self, Action};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemVerdict {
    pub sequence: usize,
    pub item_id: ItemId,
    pub action: Option<Action>,
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct Digest {
    pub topic: String,
    pub generated_at: DateTime<Utc>,
    pub discovered: Vec<ItemId>,
    /// Discovered items that had no transcript.
    pub skipped: Vec<ItemId>,
    /// Items with a transcript whose analysis request failed.
    pub failed: Vec<ItemId>,
    pub items: Vec<InjectedItem>,
    /// Raw synthesis text as returned by the model.
    pub synthesis: String,
    pub verdicts: Vec<ItemVerdict>,
    pub recommendation: Option<Action>,
    /// Every exchange of the conversation, priming and synthesis included.
    pub conversation: Vec<Turn>,
}

/// Discovery, then retrieval, then aggregation. Strictly in that order.
pub struct Pipeline<'a, D, T> {
    settings: &'a Settings,
    discovery: &'a D,
    transcripts: &'a T,
}

impl<'a, D: Discovery, T: TranscriptSource> Pipeline<'a, D, T> {
    pub fn new(settings: &'a Settings, discovery: &'a D, transcripts: &'a T) -> Self {
        Self {
            settings,
            discovery,
            transcripts,
        }
    }

    pub async fn discover(&self) -> Result<Vec<ItemId>> {
        info!(topic = %self.settings.topic, limit = self.settings.max_items, "discovering items");
        let mut ids = self
            .discovery
            .search(
                &self.settings.topic,
                &self.settings.filter,
                self.settings.max_items,
            )
            .await?;
        ids.truncate(self.settings.max_items);
        Ok(ids)
    }

    pub async fn retrieve(&self, ids: &[ItemId]) -> Result<TranscriptSet> {
        info!(items = ids.len(), "retrieving transcripts");
        let mut set = TranscriptSet::new();

        for id in ids {
            match self.transcripts.fetch_transcript(id).await? {
                Some(text) => {
                    if !set.insert(id.clone(), text) {
                        warn!(item = %id, "transcript not added (duplicate or blank)");
                    }
                }
                None => warn!(item = %id, "transcript missing; skipping item"),
            }
        }

        Ok(set)
    }

    pub async fn aggregate<M: ChatModel>(&self, model: M, set: &TranscriptSet) -> Result<Digest> {
        if set.is_empty() {
            warn!("no transcripts to analyze; synthesis will be empty");
        }

        let framing = Framing {
            topic: self.settings.topic.clone(),
            recency: self.settings.filter.recency().to_string(),
        };

        let mut aggregator = Aggregator::initialize(
            model,
            framing,
            self.settings.context_policy,
            self.settings.inject_failure,
            set.len(),
        )
        .await?;

        for (id, text) in set.iter() {
            aggregator.inject(id, text).await?;
        }

        let synthesis = aggregator.synthesize().await?;

        let mut verdicts = synthesis
            .items
            .iter()
            .map(|item| ItemVerdict {
                sequence: item.sequence,
                item_id: item.item_id.clone(),
                action: None,
            })
            .collect::<Vec<_>>();

        for (ordinal, action) in verdict::parse_item_verdicts(&synthesis.text) {
            match synthesis.item_for(ordinal) {
                Some(id) => {
                    if let Some(entry) = verdicts.iter_mut().find(|v| &v.item_id == id) {
                        entry.action = Some(action);
                    }
                }
                None => debug!(ordinal, %action, "reply names a video that was never sent"),
            }
        }

        Ok(Digest {
            topic: self.settings.topic.clone(),
            generated_at: Utc::now(),
            discovered: Vec::new(),
            skipped: Vec::new(),
            failed: synthesis.failed,
            recommendation: verdict::parse_recommendation(&synthesis.text),
            synthesis: synthesis.text,
            items: synthesis.items,
            verdicts,
            conversation: synthesis.history,
        })
    }

    pub async fn run<M: ChatModel>(&self, model: M) -> Result<Digest> {
        let discovered = self.discover().await?;
        let set = self.retrieve(&discovered).await?;
        let skipped = discovered
            .iter()
            .filter(|id| !set.contains(id))
            .cloned()
            .collect();

        let mut digest = self.aggregate(model, &set).await?;
        digest.discovered = discovered;
        digest.skipped = skipped;
        Ok(digest)
    }
}
