use super::{ContentResult, ContentSource, HeadlineStore};
use crate::debate::{Exchange, ExchangeRole};
use crate::llm::{ChatMessage, ChatRole, GenerateRequest, LlmProvider};
use crate::types::GenerationKnobs;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Content source backed by a headline store and a text-generation provider
pub struct LlmContentSource {
    llm: Arc<dyn LlmProvider>,
    headlines: Arc<dyn HeadlineStore>,
    timeout: Duration,
}

impl LlmContentSource {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        headlines: Arc<dyn HeadlineStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            llm,
            headlines,
            timeout,
        }
    }

    fn opponent_request(
        &self,
        topic: &str,
        history: &[Exchange],
        knobs: GenerationKnobs,
    ) -> GenerateRequest {
        GenerateRequest {
            system: format!(
                "You are arguing AGAINST the topic: {}. Respond in 1 short, simple, confident sentence.",
                topic
            ),
            messages: history
                .iter()
                .map(|exchange| ChatMessage {
                    role: match exchange.role {
                        ExchangeRole::User => ChatRole::User,
                        ExchangeRole::Assistant => ChatRole::Assistant,
                    },
                    content: exchange.text.clone(),
                })
                .collect(),
            temperature: Some(knobs.temperature),
            max_tokens: Some(knobs.max_tokens),
            timeout: self.timeout,
        }
    }

    fn options_request(&self, topic: &str, knobs: GenerationKnobs) -> GenerateRequest {
        GenerateRequest {
            system: format!(
                "Return ONLY a JSON array of 3 short strings arguing IN FAVOR of {}.",
                topic
            ),
            messages: Vec::new(),
            temperature: Some(knobs.temperature),
            max_tokens: Some(knobs.max_tokens),
            timeout: self.timeout,
        }
    }
}

#[async_trait]
impl ContentSource for LlmContentSource {
    async fn headline_text(&self, question_id: &str) -> ContentResult<String> {
        self.headlines.headline(question_id).await
    }

    async fn opponent_argument(
        &self,
        topic: &str,
        history: &[Exchange],
        knobs: GenerationKnobs,
    ) -> ContentResult<String> {
        let request = self.opponent_request(topic, history, knobs);
        let response = self.llm.generate(request).await?;
        Ok(response.text)
    }

    async fn candidate_arguments_raw(
        &self,
        topic: &str,
        knobs: GenerationKnobs,
    ) -> ContentResult<String> {
        let request = self.options_request(topic, knobs);
        let response = self.llm.generate(request).await?;
        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentError, StaticHeadlines};
    use crate::debate::DEFAULT_CANDIDATE_ARGUMENTS;
    use crate::llm::{GenerateResponse, LlmError, LlmResult, ResponseMetadata};
    use std::sync::Mutex;

    /// Records every request and answers with a fixed reply
    struct RecordingProvider {
        reply: Option<String>,
        seen: Mutex<Vec<GenerateRequest>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse> {
            self.seen.lock().unwrap().push(request);
            match &self.reply {
                Some(text) => Ok(GenerateResponse {
                    text: text.clone(),
                    metadata: ResponseMetadata {
                        provider: "recording".to_string(),
                        model: "test".to_string(),
                        tokens_used: None,
                        latency_ms: 0,
                    },
                }),
                None => Err(LlmError::Timeout(Duration::from_secs(1))),
            }
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn source(reply: Option<&str>) -> (LlmContentSource, Arc<RecordingProvider>) {
        let provider = Arc::new(RecordingProvider {
            reply: reply.map(str::to_string),
            seen: Mutex::new(Vec::new()),
        });
        let source = LlmContentSource::new(
            provider.clone(),
            Arc::new(StaticHeadlines::builtin()),
            Duration::from_secs(5),
        );
        (source, provider)
    }

    const KNOBS: GenerationKnobs = GenerationKnobs {
        temperature: 0.7,
        max_tokens: 200,
    };

    #[tokio::test]
    async fn test_opponent_prompt_carries_history() {
        let (source, provider) = source(Some("AI has no soul."));
        let history = vec![
            Exchange {
                role: ExchangeRole::Assistant,
                text: "AI copies.".to_string(),
                ts: String::new(),
            },
            Exchange {
                role: ExchangeRole::User,
                text: "AI helps.".to_string(),
                ts: String::new(),
            },
        ];

        let text = source
            .opponent_argument("AI art", &history, KNOBS)
            .await
            .unwrap();
        assert_eq!(text, "AI has no soul.");

        let seen = provider.seen.lock().unwrap();
        let request = &seen[0];
        assert!(request.system.contains("AGAINST the topic: AI art"));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, ChatRole::Assistant);
        assert_eq!(request.messages[1].content, "AI helps.");
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(200));
    }

    #[tokio::test]
    async fn test_candidate_arguments_parsed_from_reply() {
        let (source, provider) = source(Some(r#"Sure: ["X.", "Y.", "Z."]"#));
        let knobs = GenerationKnobs {
            temperature: 0.8,
            max_tokens: 200,
        };

        let arguments = source.candidate_user_arguments("AI art", knobs).await;
        assert_eq!(arguments, ["X.", "Y.", "Z."]);

        let seen = provider.seen.lock().unwrap();
        assert!(seen[0].system.contains("IN FAVOR of AI art"));
        assert!(seen[0].messages.is_empty());
        assert_eq!(seen[0].temperature, Some(0.8));
    }

    #[tokio::test]
    async fn test_failures_surface_or_fall_back() {
        let (source, _) = source(None);

        let result = source.opponent_argument("AI art", &[], KNOBS).await;
        assert!(matches!(result, Err(ContentError::Llm(LlmError::Timeout(_)))));

        let arguments = source.candidate_user_arguments("AI art", KNOBS).await;
        assert_eq!(arguments, DEFAULT_CANDIDATE_ARGUMENTS);
    }

    #[tokio::test]
    async fn test_headline_from_store() {
        let (source, _) = source(None);
        let headline = source.headline_text("1").await.unwrap();
        assert!(headline.contains("lucky guesses"));
        assert!(source.headline_text("99").await.is_err());
    }
}
