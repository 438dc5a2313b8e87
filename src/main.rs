//! elfa CLI entry point

use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use elfa_actions::actions::{ActionOrchestrator, ActionRegistry, ParameterExtractor, RequestDispatcher};
use elfa_actions::adapters::CliChannel;
use elfa_actions::agent::{LlmClient, ProviderRegistry};
use elfa_actions::config::{self, Config, ProcessEnv, Settings, API_KEY_KEY, BASE_URL_KEY};
use elfa_actions::ui;

#[derive(Parser)]
#[command(name = "elfa")]
#[command(about = "Ask the Elfa social analytics API questions in plain language")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record Elfa and Gemini credentials
    Onboard,

    /// List available actions
    Actions,

    /// Run a single request
    Run {
        /// Request text
        #[arg(short, long)]
        message: String,

        /// Action name or simile (routed from the message when omitted)
        #[arg(short, long)]
        action: Option<String>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Interactive session
    Chat,

    /// Show configuration status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Second Ctrl+C within 3 seconds exits
    let exit_flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let r = exit_flag.clone();

    ctrlc::set_handler(move || {
        if r.load(std::sync::atomic::Ordering::SeqCst) {
            println!("\n👋 Bye!");
            std::process::exit(0);
        } else {
            println!("\n⚠️  Press Ctrl+C again to exit");
            r.store(true, std::sync::atomic::Ordering::SeqCst);

            let r2 = r.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_secs(3));
                r2.store(false, std::sync::atomic::Ordering::SeqCst);
            });
        }
    })
    .ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            config::onboard()?;
            println!("\nNext: elfa run -m \"What are the trending tokens today?\"");
        }

        Commands::Actions => {
            let registry = ActionRegistry::elfa();
            ui::print_header("Actions");
            for action in registry.iter() {
                println!("  {} {}", action.name.yellow().bold(), action.path.black().bold());
                println!("      {}", action.description);
                println!("      triggers: {}", action.similes.join(", ").cyan());
            }
        }

        Commands::Run {
            message,
            action,
            timeout_secs,
        } => {
            let config = config::load()?;
            let timeout = timeout_secs.map(Duration::from_secs);
            let mut channel = build_channel(config, timeout)?;

            let spinner = ui::spinner("Asking Elfa");
            let run = channel.run_once(&message, action.as_deref());
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, run)
                    .await
                    .with_context(|| format!("Timed out after {}s", limit.as_secs())),
                None => Ok(run.await),
            };
            spinner.finish_and_clear();

            let outcome = result??;
            if outcome.success {
                println!("{}", outcome.message.text);
            } else {
                ui::print_warning(&outcome.message.text);
                std::process::exit(1);
            }
        }

        Commands::Chat => {
            let config = config::load()?;
            let mut channel = build_channel(config, None)?;
            ui::print_header("Interactive mode (Ctrl+C or 'exit' to quit)");
            channel.run_interactive().await?;
        }

        Commands::Status => {
            let config = config::load()?;
            let env = ProcessEnv;
            ui::print_header("Status");
            ui::print_step(&format!("Config file: {:?}", config::config_path()));
            ui::print_step(&format!(
                "Provider: {} (available: {})",
                config.provider,
                ProviderRegistry::available().join(", ")
            ));
            ui::print_step(&format!("Model: {}", config.model));
            ui::print_step(&format!(
                "Gemini API key: {}",
                if config.gemini_api_key.is_empty() { "not set".to_string() } else { ui::mask(&config.gemini_api_key) }
            ));

            for key in [BASE_URL_KEY, API_KEY_KEY] {
                let (value, source) = match config.get_setting(key).filter(|v| !v.trim().is_empty()) {
                    Some(v) => (Some(v), "settings"),
                    None => (env.get_setting(key).filter(|v| !v.trim().is_empty()), "environment"),
                };
                match value {
                    Some(v) if key == API_KEY_KEY => {
                        ui::print_step(&format!("{key}: {} ({source})", ui::mask(&v)))
                    }
                    Some(v) => ui::print_step(&format!("{key}: {v} ({source})")),
                    None => ui::print_step(&format!("{key}: not set")),
                }
            }

            match config::resolve(&config, &env) {
                Ok(_) => ui::print_success("Elfa actions are ready"),
                Err(e) => ui::print_error(&e.to_string()),
            }
        }
    }

    Ok(())
}

fn build_channel(config: Config, timeout: Option<Duration>) -> Result<CliChannel<Box<dyn LlmClient>>> {
    let llm = ProviderRegistry::create(&config)?;
    let mut orchestrator = ActionOrchestrator::new(llm)
        .with_extractor(ParameterExtractor::new(config.history_window));
    if let Some(limit) = timeout {
        orchestrator = orchestrator.with_dispatcher(RequestDispatcher::with_timeout(limit)?);
    }
    Ok(CliChannel::new(orchestrator, ActionRegistry::elfa(), config))
}
