//! OpenAI-compatible chat-completions client

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmSettings;
use crate::{Error, Result};

pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    api_base_url: String,
    temperature: f32,
}

impl LlmClient {
    /// Build a client; fails when no API key is configured
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("LLM requires an API key".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model: settings.model.clone(),
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            temperature: settings.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One system + user exchange; returns the first choice's content
    pub async fn chat(&self, system_prompt: &str, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MessageContent,
        }

        #[derive(Deserialize)]
        struct MessageContent {
            content: String,
        }

        let url = format!("{}/chat/completions", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&Request {
                model: &self.model,
                messages: vec![
                    Message {
                        role: "system",
                        content: system_prompt,
                    },
                    Message {
                        role: "user",
                        content: prompt,
                    },
                ],
                temperature: self.temperature,
            })
            .send()
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Error::Llm(format!("Chat completion failed: {}", resp.status())));
        }

        let result: Response = resp.json().await.map_err(|e| Error::Llm(e.to_string()))?;
        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(Error::Llm("Empty completion".to_string()));
        }
        Ok(content.trim().to_string())
    }
}
