use crate::core::session::{Speaker, Turn};
use crate::error::{Error, Result};
use async_openai::{
    self,
    config::OpenAIConfig,
    types::responses::{
        CreateResponseArgs, EasyInputMessageArgs, InputItem, InputParam, OutputItem,
        OutputMessageContent, Role,
    },
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A conversational model that answers the latest turn of a history.
#[async_trait(?Send)]
pub trait ChatModel {
    async fn send(&self, history: &[&Turn]) -> Result<String>;
}

/// Sampling knobs forwarded to the model service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: Option<u32>,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_p: 0.8,
            top_k: Some(30),
            max_output_tokens: 8192,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model: String,
    pub api_key: String,
    pub api_base: Option<String>,
    pub generation: GenerationConfig,
}

/// Chat model backed by the OpenAI Responses API.
///
/// History is kept on the client and replayed in full with each request.
#[derive(Clone)]
pub struct OpenAiChat {
    client: async_openai::Client<OpenAIConfig>,
    model: String,
    generation: GenerationConfig,
}

impl OpenAiChat {
    pub fn new(config: ModelConfig) -> Self {
        let mut openai = OpenAIConfig::new().with_api_key(config.api_key);
        if let Some(base) = config.api_base {
            openai = openai.with_api_base(base);
        }

        if let Some(top_k) = config.generation.top_k {
            debug!(top_k, "top_k is not supported by the Responses API; ignoring");
        }

        Self {
            client: async_openai::Client::with_config(openai),
            model: config.model,
            generation: config.generation,
        }
    }
}

fn to_input_item(turn: &Turn) -> Result<InputItem> {
    let role = match turn.speaker {
        Speaker::User => Role::User,
        Speaker::Model => Role::Assistant,
    };

    Ok(InputItem::EasyMessage(
        EasyInputMessageArgs::default()
            .role(role)
            .content(turn.text.as_str())
            .build()?,
    ))
}

#[async_trait(?Send)]
impl ChatModel for OpenAiChat {
    async fn send(&self, history: &[&Turn]) -> Result<String> {
        let items = history
            .iter()
            .map(|turn| to_input_item(turn))
            .collect::<Result<Vec<_>>>()?;

        let request = CreateResponseArgs::default()
            .model(self.model.as_str())
            .temperature(self.generation.temperature)
            .top_p(self.generation.top_p)
            .max_output_tokens(self.generation.max_output_tokens)
            .input(InputParam::Items(items))
            .build()?;

        let response = self.client.responses().create(request).await?;

        let mut content = String::new();
        for output in response.output {
            if let OutputItem::Message(out) = output {
                for c in out.content {
                    match c {
                        OutputMessageContent::OutputText(text) => content.push_str(&text.text),
                        _ => {
                            debug!("skipping non-text output content: {c:?}");
                            continue;
                        }
                    }
                }
            }
        }

        if content.trim().is_empty() {
            return Err(Error::model("response contained no text"));
        }

        Ok(content)
    }
}

#[cfg(test)]
pub mod testing {
    use super::ChatModel;
    use crate::core::session::Turn;
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned replies and records every request it receives.
    #[derive(Default)]
    pub struct ScriptedModel {
        replies: RefCell<VecDeque<Result<String>>>,
        pub requests: RefCell<Vec<Vec<Turn>>>,
    }

    impl ScriptedModel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, text: &str) -> Self {
            self.replies.borrow_mut().push_back(Ok(text.to_string()));
            self
        }

        pub fn fail(self, message: &str) -> Self {
            self.replies
                .borrow_mut()
                .push_back(Err(Error::model(message)));
            self
        }

        /// The last user message of every request, in order.
        pub fn prompts(&self) -> Vec<String> {
            self.requests
                .borrow()
                .iter()
                .filter_map(|request| request.last().map(|turn| turn.text.clone()))
                .collect()
        }
    }

    #[async_trait(?Send)]
    impl<'a> ChatModel for &'a ScriptedModel {
        async fn send(&self, history: &[&Turn]) -> Result<String> {
            self.requests
                .borrow_mut()
                .push(history.iter().map(|turn| (*turn).clone()).collect());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok("noted".to_string()))
        }
    }
}
