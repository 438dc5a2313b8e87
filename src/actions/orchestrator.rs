//! Action orchestrator - config, extraction, dispatch, summary

use serde_json::Value;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::agent::{ActionMessage, LlmClient, Message};
use crate::config::{self, ElfaConfig, Settings};
use crate::error::Error;
use crate::Result;

use super::dispatcher::RequestDispatcher;
use super::extractor::ParameterExtractor;
use super::{summarizer, ActionDescriptor};

/// Inputs for a single invocation.
#[derive(Clone, Copy)]
pub struct ActionContext<'a> {
    /// Runtime settings, consulted first
    pub settings: &'a dyn Settings,
    /// Environment, consulted second
    pub env: &'a dyn Settings,
    /// Conversation so far, oldest first
    pub history: &'a [Message],
}

/// Result of running an action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: ActionMessage,
}

/// Runs any [`ActionDescriptor`] through the shared pipeline.
pub struct ActionOrchestrator<C: LlmClient> {
    llm: C,
    extractor: ParameterExtractor,
    dispatcher: RequestDispatcher,
}

impl<C: LlmClient> ActionOrchestrator<C> {
    pub fn new(llm: C) -> Self {
        Self {
            llm,
            extractor: ParameterExtractor::default(),
            dispatcher: RequestDispatcher::new(),
        }
    }

    pub fn with_extractor(mut self, extractor: ParameterExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: RequestDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// True when the Elfa configuration resolves.
    pub fn validate(&self, ctx: &ActionContext<'_>) -> bool {
        match config::resolve(ctx.settings, ctx.env) {
            Ok(_) => true,
            Err(e) => {
                warn!("Elfa configuration invalid: {}", e);
                false
            }
        }
    }

    /// Run `action` end to end.
    ///
    /// A configuration failure is returned as `Err`. Every later failure
    /// becomes a user-facing message with `success == false`. The message
    /// is handed to `callback` (if any) and returned in the outcome.
    pub async fn execute(
        &self,
        action: &ActionDescriptor,
        ctx: &ActionContext<'_>,
        callback: Option<&mut (dyn FnMut(&ActionMessage) + Send)>,
    ) -> Result<ActionOutcome> {
        let span = info_span!("elfa_action", action = action.name, invocation = %Uuid::new_v4());

        let outcome = async {
            let elfa = config::resolve(ctx.settings, ctx.env).map_err(|e| {
                warn!("{} not run: {}", action.name, e);
                e
            })?;
            Ok::<_, Error>(self.run(action, &elfa, ctx.history).await)
        }
        .instrument(span)
        .await?;

        if let Some(callback) = callback {
            callback(&outcome.message);
        }
        Ok(outcome)
    }

    async fn run(
        &self,
        action: &ActionDescriptor,
        elfa: &ElfaConfig,
        history: &[Message],
    ) -> ActionOutcome {
        info!("Running {}", action.name);

        let params = match self.extractor.extract(&self.llm, action, history).await {
            Ok(params) => params,
            Err(Error::InvalidExtraction { problems }) => {
                return failure(
                    action,
                    format!(
                        "Invalid {} parameters provided: {}",
                        action.subject,
                        problems.join("; ")
                    ),
                    None,
                );
            }
            Err(e) => {
                warn!("{} extraction failed: {}", action.name, e);
                return failure(
                    action,
                    format!("Error {}: could not extract parameters: {}", action.activity, e),
                    None,
                );
            }
        };

        let query = action.schema.query_params(&params);
        let response = match self.dispatcher.dispatch(elfa, action.path, &query).await {
            Ok(response) => response,
            Err(e) => {
                warn!("{} failed upstream: {}", action.name, e);
                return failure(action, format!("Error {}: {}", action.activity, e), None);
            }
        };

        match summarizer::summarize(&self.llm, action, &response.body).await {
            Ok(summary) => {
                info!("{} completed ({} bytes)", action.name, response.raw.len());
                ActionOutcome {
                    success: true,
                    message: ActionMessage::new(
                        action.name,
                        format!("{}\n\n{}", summary, response.raw),
                    )
                    .with_content(response.body),
                }
            }
            Err(e) => {
                warn!("{} summary failed: {}", action.name, e);
                failure(
                    action,
                    format!("Error {}: {}\n\n{}", action.activity, e, response.raw),
                    Some(response.body),
                )
            }
        }
    }
}

fn failure(action: &ActionDescriptor, text: String, content: Option<Value>) -> ActionOutcome {
    let mut message = ActionMessage::new(action.name, text);
    message.content = content;
    ActionOutcome {
        success: false,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::catalog;
    use crate::agent::llm::{FakeLlmClient, FakeReply};
    use crate::agent::GeminiClient;
    use crate::config::{API_KEY_KEY, BASE_URL_KEY};
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> HashMap<String, String> {
        HashMap::from([
            (BASE_URL_KEY.to_string(), base_url.to_string()),
            (API_KEY_KEY.to_string(), "test-key".to_string()),
        ])
    }

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[tokio::test]
    async fn test_every_action_refuses_incomplete_config() {
        let orchestrator = ActionOrchestrator::new(FakeLlmClient::new(vec![]));
        let env = no_env();

        for (i, action) in catalog::all().iter().enumerate() {
            // Rotate through: nothing set, blank base URL, key only.
            let (settings, expected): (HashMap<String, String>, Vec<&str>) = match i % 3 {
                0 => (HashMap::new(), vec![BASE_URL_KEY, API_KEY_KEY]),
                1 => (
                    HashMap::from([
                        (BASE_URL_KEY.to_string(), "  ".to_string()),
                        (API_KEY_KEY.to_string(), "k".to_string()),
                    ]),
                    vec![BASE_URL_KEY],
                ),
                _ => (
                    HashMap::from([(BASE_URL_KEY.to_string(), "http://localhost".to_string())]),
                    vec![API_KEY_KEY],
                ),
            };
            let ctx = ActionContext {
                settings: &settings,
                env: &env,
                history: &[],
            };

            assert!(!orchestrator.validate(&ctx), "{} validated", action.name);
            match orchestrator.execute(action, &ctx, None).await {
                Err(Error::Configuration { missing }) => {
                    assert_eq!(missing, expected, "{}", action.name)
                }
                other => panic!("{}: unexpected {:?}", action.name, other),
            }
        }
    }

    #[tokio::test]
    async fn test_execute_without_config_errors() {
        let orchestrator = ActionOrchestrator::new(FakeLlmClient::new(vec![]));
        let env = no_env();
        let settings = HashMap::from([(API_KEY_KEY.to_string(), "k".to_string())]);
        let ctx = ActionContext {
            settings: &settings,
            env: &env,
            history: &[],
        };

        let err = orchestrator
            .execute(&catalog::PING, &ctx, None)
            .await
            .unwrap_err();
        match err {
            Error::Configuration { missing } => assert_eq!(missing, vec![BASE_URL_KEY]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ping_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/ping"))
            .and(header("x-elfa-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let llm = FakeLlmClient::new(vec![FakeReply::Text("The Elfa API is up.".into())]);
        let orchestrator = ActionOrchestrator::new(llm);
        let settings = settings(&server.uri());
        let env = no_env();
        let history = [Message::user("ping elfa")];
        let ctx = ActionContext {
            settings: &settings,
            env: &env,
            history: &history,
        };

        let mut emitted = Vec::new();
        let mut callback = |m: &ActionMessage| emitted.push(m.clone());
        let outcome = orchestrator
            .execute(&catalog::PING, &ctx, Some(&mut callback))
            .await
            .unwrap();

        assert!(outcome.success);
        assert!(outcome.message.text.contains("ok"));
        assert_eq!(outcome.message.action, "ELFA_PING");
        assert_eq!(outcome.message.content, Some(json!({"status": "ok"})));
        assert_eq!(emitted, vec![outcome.message.clone()]);
    }

    #[tokio::test]
    async fn test_success_appends_raw_body_verbatim() {
        let raw = "{ \"data\" : [ {\"ticker\":\"SOL\", \"mentions\": 42} ],\n  \"success\": true }";
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/trending-tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_string(raw))
            .mount(&server)
            .await;

        let llm = FakeLlmClient::extract_then_summarize(json!({}), "SOL leads with 42 mentions.");
        let orchestrator = ActionOrchestrator::new(llm);
        let settings = settings(&server.uri());
        let env = no_env();
        let ctx = ActionContext {
            settings: &settings,
            env: &env,
            history: &[],
        };

        let outcome = orchestrator
            .execute(&catalog::TRENDING_TOKENS, &ctx, None)
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(
            outcome.message.text,
            format!("SOL leads with 42 mentions.\n\n{}", raw)
        );
    }

    #[tokio::test]
    async fn test_top_mentions_defaults_applied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/top-mentions"))
            .and(query_param("ticker", "SOL"))
            .and(query_param("timeWindow", "1h"))
            .and(query_param("page", "1"))
            .and(query_param("pageSize", "10"))
            .and(query_param("includeAccountDetails", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":[]}"#))
            .expect(1)
            .mount(&server)
            .await;

        let llm = FakeLlmClient::extract_then_summarize(json!({"ticker": "SOL"}), "No mentions.");
        let orchestrator = ActionOrchestrator::new(llm);
        let settings = settings(&server.uri());
        let env = no_env();
        let history = [Message::user("what are the top mentions of SOL?")];
        let ctx = ActionContext {
            settings: &settings,
            env: &env,
            history: &history,
        };

        let outcome = orchestrator
            .execute(&catalog::TOP_MENTIONS, &ctx, None)
            .await
            .unwrap();
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn test_invalid_extraction_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(0)
            .mount(&server)
            .await;

        let llm = FakeLlmClient::new(vec![FakeReply::Object(
            json!({"from": 1738675001, "to": 1738775001}),
        )]);
        let orchestrator = ActionOrchestrator::new(llm);
        let settings = settings(&server.uri());
        let env = no_env();
        let ctx = ActionContext {
            settings: &settings,
            env: &env,
            history: &[],
        };

        let outcome = orchestrator
            .execute(&catalog::SEARCH_MENTIONS, &ctx, None)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.text.starts_with("Invalid search mentions parameters provided"));
        assert!(outcome.message.text.contains("keywords"));
        assert!(outcome.message.content.is_none());
    }

    #[tokio::test]
    async fn test_mistyped_trending_params_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(0)
            .mount(&server)
            .await;

        let llm = FakeLlmClient::new(vec![FakeReply::Object(
            json!({"timeWindow": "24h", "pageSize": "fifty"}),
        )]);
        let orchestrator = ActionOrchestrator::new(llm);
        let settings = settings(&server.uri());
        let env = no_env();
        let ctx = ActionContext {
            settings: &settings,
            env: &env,
            history: &[],
        };

        let outcome = orchestrator
            .execute(&catalog::TRENDING_TOKENS, &ctx, None)
            .await
            .unwrap();
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn test_upstream_401() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/account/smart-stats"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid API key"})),
            )
            .mount(&server)
            .await;

        let llm = FakeLlmClient::new(vec![FakeReply::Object(json!({"username": "elfa_ai"}))]);
        let orchestrator = ActionOrchestrator::new(llm);
        let settings = settings(&server.uri());
        let env = no_env();
        let ctx = ActionContext {
            settings: &settings,
            env: &env,
            history: &[],
        };

        let outcome = orchestrator
            .execute(&catalog::ACCOUNT_STATS, &ctx, None)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.text.contains("Invalid API key"));
        assert!(outcome.message.text.contains("401"));
    }

    #[tokio::test]
    async fn test_summary_failure_keeps_raw_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/key-status"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"usage":12}"#))
            .mount(&server)
            .await;

        let llm = FakeLlmClient::new(vec![FakeReply::Fail("model overloaded".into())]);
        let orchestrator = ActionOrchestrator::new(llm);
        let settings = settings(&server.uri());
        let env = no_env();
        let ctx = ActionContext {
            settings: &settings,
            env: &env,
            history: &[],
        };

        let outcome = orchestrator
            .execute(&catalog::KEY_STATUS, &ctx, None)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.text.contains("model overloaded"));
        assert!(outcome.message.text.ends_with(r#"{"usage":12}"#));
        assert_eq!(outcome.message.content, Some(json!({"usage": 12})));
    }

    #[tokio::test]
    async fn test_env_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
            .mount(&server)
            .await;

        let orchestrator =
            ActionOrchestrator::new(FakeLlmClient::new(vec![FakeReply::Text("up".into())]));
        let settings: HashMap<String, String> = HashMap::new();
        let env = self::settings(&server.uri());
        let ctx = ActionContext {
            settings: &settings,
            env: &env,
            history: &[],
        };

        assert!(orchestrator.validate(&ctx));
        let outcome = orchestrator.execute(&catalog::PING, &ctx, None).await.unwrap();
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn test_model_transport_failure_hides_gemini_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(0)
            .mount(&server)
            .await;

        let llm = GeminiClient::new("SECRET-GEMINI-KEY", "m").with_base_url("http://127.0.0.1:1");
        let orchestrator = ActionOrchestrator::new(llm);
        let settings = settings(&server.uri());
        let env = no_env();
        let history = [Message::user("top mentions for SOL")];
        let ctx = ActionContext {
            settings: &settings,
            env: &env,
            history: &history,
        };

        let outcome = orchestrator
            .execute(&catalog::TOP_MENTIONS, &ctx, None)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(!outcome.message.text.contains("SECRET-GEMINI-KEY"));
        assert!(outcome
            .message
            .text
            .starts_with("Error retrieving top mentions: could not extract parameters"));
    }

    #[tokio::test]
    async fn test_summary_transport_failure_hides_gemini_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
            .mount(&server)
            .await;

        let llm = GeminiClient::new("SECRET-GEMINI-KEY", "m").with_base_url("http://127.0.0.1:1");
        let orchestrator = ActionOrchestrator::new(llm);
        let settings = settings(&server.uri());
        let env = no_env();
        let ctx = ActionContext {
            settings: &settings,
            env: &env,
            history: &[],
        };

        let outcome = orchestrator.execute(&catalog::PING, &ctx, None).await.unwrap();
        assert!(!outcome.success);
        assert!(!outcome.message.text.contains("SECRET-GEMINI-KEY"));
        assert!(outcome.message.text.ends_with(r#"{"status":"ok"}"#));
    }
}
