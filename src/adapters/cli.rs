//! CLI adapter — interactive and single-message command line interface.
//!
//! Hosts the action registry for a terminal session: each line is routed
//! to an action by trigger phrase and the conversation is kept as history
//! for parameter extraction.

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::actions::{ActionContext, ActionOrchestrator, ActionOutcome, ActionRegistry};
use crate::agent::{LlmClient, Message};
use crate::config::{Config, ProcessEnv};
use crate::error::Error;
use crate::{ui, Result};

/// CLI channel for action sessions.
pub struct CliChannel<C: LlmClient> {
    orchestrator: ActionOrchestrator<C>,
    registry: ActionRegistry,
    config: Config,
    history: Vec<Message>,
}

impl<C: LlmClient> CliChannel<C> {
    /// Create a new CLI channel.
    pub fn new(orchestrator: ActionOrchestrator<C>, registry: ActionRegistry, config: Config) -> Self {
        Self {
            orchestrator,
            registry,
            config,
            history: Vec::new(),
        }
    }

    /// Run one message through an action.
    ///
    /// `action` names the action explicitly; otherwise the message is
    /// routed by trigger phrase.
    pub async fn run_once(&mut self, message: &str, action: Option<&str>) -> Result<ActionOutcome> {
        let descriptor = match action {
            Some(name) => self
                .registry
                .get(name)
                .ok_or_else(|| Error::Other(format!("Unknown action: {}", name)))?,
            None => self.registry.route(message).ok_or_else(|| {
                Error::Other(format!(
                    "No Elfa action matches that request. Try one of: {}",
                    self.registry
                        .iter()
                        .map(|a| a.similes.first().copied().unwrap_or(a.name))
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?,
        };
        debug!("Routed to {}", descriptor.name);

        // History only takes the turn once the action has run.
        let mut turn = self.history.clone();
        turn.push(Message::user(message));

        let env = ProcessEnv;
        let ctx = ActionContext {
            settings: &self.config,
            env: &env,
            history: &turn,
        };
        let outcome = self.orchestrator.execute(descriptor, &ctx, None).await?;

        turn.push(Message::assistant(outcome.message.text.clone()));
        self.history = turn;

        Ok(outcome)
    }

    /// Run interactive REPL loop.
    pub async fn run_interactive(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("\n> ");
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                // EOF
                break;
            }

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "q") {
                println!("Goodbye! 👋");
                break;
            }

            if input.eq_ignore_ascii_case("/clear") {
                self.clear_history();
                ui::print_success("History cleared");
                continue;
            }

            let spinner = ui::spinner("Asking Elfa");
            let result = self.run_once(input, None).await;
            spinner.finish_and_clear();

            match result {
                Ok(outcome) if outcome.success => println!("\n{}", outcome.message.text),
                Ok(outcome) => ui::print_warning(&outcome.message.text),
                Err(e) => ui::print_error(&e.to_string()),
            }
        }

        Ok(())
    }

    /// Clear conversation history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Get current history length.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::{FakeLlmClient, FakeReply};
    use crate::config::{API_KEY_KEY, BASE_URL_KEY};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn channel(base_url: &str, replies: Vec<FakeReply>) -> CliChannel<FakeLlmClient> {
        let mut config = Config::default();
        config.settings.insert(BASE_URL_KEY.into(), base_url.into());
        config.settings.insert(API_KEY_KEY.into(), "k".into());
        CliChannel::new(
            ActionOrchestrator::new(FakeLlmClient::new(replies)),
            ActionRegistry::elfa(),
            config,
        )
    }

    #[tokio::test]
    async fn test_run_once_routes_and_records_history() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
            .mount(&server)
            .await;

        let mut cli = channel(&server.uri(), vec![FakeReply::Text("All good.".into())]);
        let outcome = cli.run_once("can you ping elfa?", None).await.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.message.action, "ELFA_PING");
        assert_eq!(cli.history_len(), 2);

        cli.clear_history();
        assert_eq!(cli.history_len(), 0);
    }

    #[tokio::test]
    async fn test_run_once_unroutable() {
        let mut cli = channel("http://127.0.0.1:1", vec![]);
        let err = cli.run_once("what's the weather?", None).await.unwrap_err();
        assert!(err.to_string().contains("No Elfa action matches"));
        assert_eq!(cli.history_len(), 0);
    }

    #[tokio::test]
    async fn test_missing_config_leaves_history_untouched() {
        let mut config = Config::default();
        config.settings.insert(API_KEY_KEY.into(), "k".into());
        let mut cli = CliChannel::new(
            ActionOrchestrator::new(FakeLlmClient::new(vec![])),
            ActionRegistry::elfa(),
            config,
        );
        if std::env::var(BASE_URL_KEY).is_ok() {
            return;
        }

        let err = cli.run_once("ping elfa", None).await.unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert_eq!(cli.history_len(), 0);
    }

    #[tokio::test]
    async fn test_run_once_unknown_action() {
        let mut cli = channel("http://127.0.0.1:1", vec![]);
        assert!(cli.run_once("hi", Some("ELFA_NOPE")).await.is_err());
    }
}
