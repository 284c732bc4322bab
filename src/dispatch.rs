//! Analysis dispatch: one model call per action.
//!
//! The dispatcher owns nothing but an `Arc<dyn ModelClient>` built from the
//! start-up configuration. Each call sends job description, image and prompt
//! as given: empty strings are not rejected and the reply is not trimmed. No
//! retry, backoff or caching happens here, so clicking twice with identical
//! inputs calls the model twice.

use crate::config::AnalyzerConfig;
use crate::error::AtsError;
use crate::output::ImagePayload;
use crate::pipeline::llm::{self, ModelClient, ModelReply, ModelRequest};
use std::sync::Arc;
use tracing::{info, warn};

/// Sends (job description, image payload, prompt) to the remote model.
#[derive(Clone)]
pub struct AnalysisDispatcher {
    client: Arc<dyn ModelClient>,
}

impl std::fmt::Debug for AnalysisDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisDispatcher")
            .field("provider", &self.client.provider())
            .field("model", &self.client.model())
            .finish()
    }
}

impl AnalysisDispatcher {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    /// Dispatcher for the client selected by `config`.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, AtsError> {
        let client = llm::client_from_config(config)?;
        info!(
            "Model backend: {} ({})",
            client.provider(),
            client.model()
        );
        Ok(Self::new(client))
    }

    pub fn provider(&self) -> &str {
        self.client.provider()
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Return the model's reply text, unmodified.
    pub async fn analyze(
        &self,
        job_description: &str,
        payload: &ImagePayload,
        prompt: &str,
    ) -> Result<String, AtsError> {
        self.dispatch(job_description, payload, prompt)
            .await
            .map(|reply| reply.text)
    }

    /// Like [`analyze`](Self::analyze) but keeps token usage.
    pub async fn dispatch(
        &self,
        job_description: &str,
        payload: &ImagePayload,
        prompt: &str,
    ) -> Result<ModelReply, AtsError> {
        let request = ModelRequest {
            job_description,
            image: payload.first_page(),
            prompt,
        };
        self.client.generate(request).await.map_err(|e| {
            warn!("{} call failed: {}", self.client.provider(), e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ImagePart;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted outcomes and records every request it sees.
    struct ScriptedClient {
        outcomes: Mutex<VecDeque<Result<String, AtsError>>>,
        seen: Mutex<Vec<(String, String, String)>>,
    }

    impl ScriptedClient {
        fn new(outcomes: Vec<Result<String, AtsError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        fn provider(&self) -> &str {
            "scripted"
        }
        fn model(&self) -> &str {
            "test-model"
        }
        async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelReply, AtsError> {
            self.seen.lock().unwrap().push((
                request.job_description.to_string(),
                request.image.data.clone(),
                request.prompt.to_string(),
            ));
            let next = self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted outcome left");
            next.map(ModelReply::text)
        }
    }

    fn payload() -> ImagePayload {
        ImagePayload::single(ImagePart::jpeg("/9j/4AAQ"))
    }

    #[tokio::test]
    async fn reply_returned_verbatim() {
        let reply = "  Match: 64%\n\nMissing keywords: Go, gRPC\n";
        let client = ScriptedClient::new(vec![Ok(reply.to_string())]);
        let dispatcher = AnalysisDispatcher::new(client.clone());

        let text = dispatcher.analyze("JD", &payload(), "PROMPT").await.unwrap();
        assert_eq!(text, reply);

        let seen = client.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            ("JD".to_string(), "/9j/4AAQ".to_string(), "PROMPT".to_string())
        );
    }

    #[tokio::test]
    async fn empty_inputs_pass_through() {
        let client = ScriptedClient::new(vec![Ok("ok".into())]);
        let dispatcher = AnalysisDispatcher::new(client.clone());
        dispatcher.analyze("", &payload(), "").await.unwrap();
        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].0, "");
        assert_eq!(seen[0].2, "");
    }

    #[tokio::test]
    async fn failure_does_not_affect_next_call() {
        let client = ScriptedClient::new(vec![
            Err(AtsError::RateLimitExceeded {
                provider: "scripted".into(),
                retry_after_secs: None,
            }),
            Ok("second answer".into()),
        ]);
        let dispatcher = AnalysisDispatcher::new(client.clone());

        let first = dispatcher.analyze("JD", &payload(), "P").await;
        assert!(matches!(first, Err(AtsError::RateLimitExceeded { .. })));

        let second = dispatcher.analyze("JD", &payload(), "P").await.unwrap();
        assert_eq!(second, "second answer");
        assert_eq!(client.seen.lock().unwrap().len(), 2, "no hidden retries");
    }

    #[tokio::test]
    async fn identical_requests_are_not_cached() {
        let client = ScriptedClient::new(vec![Ok("a".into()), Ok("b".into())]);
        let dispatcher = AnalysisDispatcher::new(client.clone());
        assert_eq!(dispatcher.analyze("JD", &payload(), "P").await.unwrap(), "a");
        assert_eq!(dispatcher.analyze("JD", &payload(), "P").await.unwrap(), "b");
    }
}
