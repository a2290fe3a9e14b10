//! Question answering pipeline: retrieve, compose, generate

use crate::config::{Config, EmbeddingProvider};
use crate::embedding::{CachedEmbedder, Embedder, HashingEmbedder, HttpEmbedder};
use crate::error::Result;
use crate::generation::{build_generator, Generator};
use crate::knowledge::{FactStore, RetrievalResult};
use crate::metrics::METRICS;
use crate::prompt;
use crate::retrieval::Retriever;
use crate::session::{ConversationSession, ConversationTurn};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Prefix of the assistant turn recorded when a question cannot be answered
pub const ERROR_REPLY_PREFIX: &str = "Sorry, I encountered an error: ";

/// Result of one successful pipeline run
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub retrieval: RetrievalResult,
    pub prompt: String,
}

/// Grounded school Q&A assistant
#[derive(Clone)]
pub struct SchoolAssistant {
    retriever: Retriever,
    generator: Arc<dyn Generator>,
}

impl SchoolAssistant {
    pub fn new(retriever: Retriever, generator: Arc<dyn Generator>) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    /// Wire embedder, index and generation client from configuration
    pub async fn from_config(config: &Config, store: FactStore) -> Result<Self> {
        let store = if config.retrieval.collapse_duplicates {
            store.collapse_duplicates()
        } else {
            store
        };

        let embedder = build_embedder(config)?;
        let retriever = Retriever::bootstrap(&store, embedder, config.retrieval.top_k).await?;
        let generator = build_generator(&config.generation)?;

        info!(
            "Assistant ready: {} facts indexed, top_k={}, provider={}",
            retriever.index().map(|index| index.len()).unwrap_or(0),
            retriever.top_k(),
            generator.provider()
        );

        Ok(Self::new(retriever, generator))
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn generator(&self) -> &Arc<dyn Generator> {
        &self.generator
    }

    /// Answer one question
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let retrieval = self.retriever.retrieve(question).await?;
        let prompt = prompt::compose(question, &retrieval.texts());

        let provider = self.generator.provider().to_string();
        let start = Instant::now();
        let outcome = self.generator.generate(&prompt).await;
        METRICS.record_generation(&provider, outcome.is_ok(), start.elapsed().as_secs_f64());

        let text = outcome?;
        debug!("Generated {} chars with {}", text.len(), provider);

        Ok(Answer {
            text,
            retrieval,
            prompt,
        })
    }

    /// Run one chat turn against `session`
    ///
    /// Blank questions are ignored and return `None`. Otherwise the user turn
    /// and exactly one assistant turn are appended; failures become an
    /// apology turn carrying the error message.
    pub async fn handle_turn<'s>(
        &self,
        session: &'s mut ConversationSession,
        question: &str,
    ) -> Option<&'s ConversationTurn> {
        if question.trim().is_empty() {
            return None;
        }

        let session_id = session.id();
        session.push_user(question);

        let reply = match self.answer(question).await {
            Ok(answer) => {
                info!(session = %session_id, facts = ?answer.retrieval.ids(), "Question answered");
                answer.text
            }
            Err(e) => {
                error!(session = %session_id, "Failed to answer question: {}", e);
                format!("{}{}", ERROR_REPLY_PREFIX, e)
            }
        };

        Some(session.push_assistant(reply))
    }
}

fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.embedding.provider {
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(config.embedding.dimension)),
        EmbeddingProvider::Http => {
            let http: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(&config.embedding)?);
            Arc::new(CachedEmbedder::new(http, config.embedding.query_cache_size))
        }
    };

    debug!("Using embedder {}", embedder.model_id());
    Ok(embedder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationError;
    use crate::knowledge::school_knowledge_base;
    use crate::session::Role;
    use async_trait::async_trait;
    use secrecy::SecretString;
    use std::sync::Mutex;

    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        fn provider(&self) -> &str {
            "recording"
        }

        async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("Yes!".to_string())
        }
    }

    async fn assistant_with(generator: Arc<dyn Generator>) -> SchoolAssistant {
        let store = school_knowledge_base().unwrap();
        let retriever = Retriever::bootstrap(&store, Arc::new(HashingEmbedder::default()), 2)
            .await
            .unwrap();
        SchoolAssistant::new(retriever, generator)
    }

    #[tokio::test]
    async fn test_answer_sends_composed_prompt() {
        let generator = Arc::new(RecordingGenerator {
            prompts: Mutex::new(Vec::new()),
        });
        let assistant = assistant_with(generator.clone()).await;

        let answer = assistant.answer("When is the library open?").await.unwrap();

        assert_eq!(answer.text, "Yes!");
        assert_eq!(answer.retrieval.len(), 2);
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0], answer.prompt);
        assert!(answer.prompt.contains("STUDENT'S QUESTION: When is the library open?"));
    }

    #[tokio::test]
    async fn test_blank_question_is_ignored() {
        let generator = Arc::new(RecordingGenerator {
            prompts: Mutex::new(Vec::new()),
        });
        let assistant = assistant_with(generator.clone()).await;
        let mut session = ConversationSession::new();

        assert!(assistant.handle_turn(&mut session, "   ").await.is_none());
        assert!(session.is_empty());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handle_turn_appends_pair() {
        let generator = Arc::new(RecordingGenerator {
            prompts: Mutex::new(Vec::new()),
        });
        let assistant = assistant_with(generator).await;
        let mut session = ConversationSession::new();

        let reply = assistant
            .handle_turn(&mut session, "Is there pizza on Friday?")
            .await
            .unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "Yes!");

        assert_eq!(session.len(), 2);
        assert_eq!(session.turns()[0].role, Role::User);
        assert_eq!(session.turns()[0].content, "Is there pizza on Friday?");
    }

    #[tokio::test]
    async fn test_question_recorded_and_prompted_verbatim() {
        let generator = Arc::new(RecordingGenerator {
            prompts: Mutex::new(Vec::new()),
        });
        let assistant = assistant_with(generator.clone()).await;
        let mut session = ConversationSession::new();
        let raw = "  Is there pizza on Friday?\t";

        assistant.handle_turn(&mut session, raw).await.unwrap();

        assert_eq!(session.turns()[0].content, raw);
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("STUDENT'S QUESTION:   Is there pizza on Friday?\t\n"));
    }

    #[tokio::test]
    async fn test_from_config_builds_hashing_pipeline() {
        let mut config = Config::default();
        config.generation.api_key = Some(SecretString::new("test-key".to_string()));
        config.retrieval.top_k = 3;

        let assistant = SchoolAssistant::from_config(&config, school_knowledge_base().unwrap())
            .await
            .unwrap();

        assert_eq!(assistant.retriever().top_k(), 3);
        assert_eq!(assistant.retriever().index().unwrap().len(), 10);
        assert_eq!(assistant.generator().provider(), "gemini");
    }

    #[tokio::test]
    async fn test_from_config_without_generation_key_fails() {
        let config = Config::default();
        let result = SchoolAssistant::from_config(&config, school_knowledge_base().unwrap()).await;
        assert!(result.is_err());
    }
}
