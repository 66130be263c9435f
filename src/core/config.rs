use crate::core::aggregator::InjectFailurePolicy;
use crate::core::filter::SearchFilter;
use crate::core::model::{GenerationConfig, ModelConfig};
use crate::core::session::{ContextPolicy, ContextPolicyKind};
use crate::error::{Error, Result};

pub const DEFAULT_TOPIC: &str = "xrp";
pub const DEFAULT_MAX_ITEMS: usize = 3;
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub topic: String,
    pub max_items: usize,
    pub filter: SearchFilter,
    pub languages: Vec<String>,
    pub context_policy: ContextPolicy,
    pub inject_failure: InjectFailurePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            max_items: DEFAULT_MAX_ITEMS,
            filter: SearchFilter::default(),
            languages: vec!["en".to_string()],
            context_policy: ContextPolicy::default(),
            inject_failure: InjectFailurePolicy::default(),
        }
    }
}

impl Settings {
    pub fn validate(self) -> Result<Self> {
        if self.topic.trim().is_empty() {
            return Err(Error::config("topic must not be empty"));
        }
        if self.max_items == 0 {
            return Err(Error::config("max items must be at least 1"));
        }
        if self.languages.is_empty() {
            return Err(Error::config("at least one transcript language is required"));
        }
        Ok(self)
    }
}

/// Splits a comma-separated language list, dropping blanks.
pub fn parse_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn context_policy(kind: ContextPolicyKind, limit: Option<usize>) -> Result<ContextPolicy> {
    match (kind, limit) {
        (ContextPolicyKind::Unbounded, _) => Ok(ContextPolicy::Unbounded),
        (ContextPolicyKind::SlidingWindow, Some(turns)) if turns > 0 => {
            Ok(ContextPolicy::SlidingWindow { turns })
        }
        (ContextPolicyKind::CharBudget, Some(chars)) if chars > 0 => {
            Ok(ContextPolicy::CharBudget { chars })
        }
        (kind, _) => Err(Error::config(format!(
            "context policy {kind:?} needs a positive --context-limit"
        ))),
    }
}

pub fn validate_generation(generation: &GenerationConfig) -> Result<()> {
    if !(0.0..=2.0).contains(&generation.temperature) {
        return Err(Error::config("temperature must be between 0 and 2"));
    }
    if !(0.0..=1.0).contains(&generation.top_p) {
        return Err(Error::config("top-p must be between 0 and 1"));
    }
    if generation.top_k == Some(0) {
        return Err(Error::config("top-k must be positive"));
    }
    if generation.max_output_tokens == 0 {
        return Err(Error::config("max output tokens must be positive"));
    }
    Ok(())
}

pub fn model_config(
    model: String,
    api_key: Option<String>,
    api_base: Option<String>,
    generation: GenerationConfig,
) -> Result<ModelConfig> {
    let api_key = api_key
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| Error::config("OPENAI_API_KEY is not set"))?;
    validate_generation(&generation)?;

    Ok(ModelConfig {
        model,
        api_key,
        api_base: api_base.filter(|base| !base.trim().is_empty()),
        generation,
    })
}
