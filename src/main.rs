use anyhow::Context;
use clap::Parser;
use gui::App;
use iced::{Application, Command, Settings, Size};
use persona_core::{AppConfig, CoreError, ErrorReporter, ModelName, RunConfig};
use pipeline::{AnalysisOutcome, RunRequest};
use report::ArtifactPaths;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const PREVIEW_CHARS: usize = 600;
const DEFAULT_LOG_FILTER: &str =
    "persona_digest=info,pipeline=info,reddit_client=info,llm_interface=info,report=info,gui=info";

/// Build a personality profile from a Reddit user's public posts and comments.
#[derive(Debug, Parser)]
#[command(name = "persona-digest", version)]
struct Cli {
    /// Reddit profile URL, e.g. https://www.reddit.com/user/kojied/.
    /// Opens the desktop UI when omitted.
    #[arg(long)]
    url: Option<String>,

    /// Maximum number of posts and comments to analyze
    #[arg(long, default_value_t = RunConfig::DEFAULT_DEPTH, allow_negative_numbers = true)]
    depth: i64,

    /// Groq model used for the analysis
    #[arg(long, default_value = ModelName::default().as_str())]
    model: String,

    /// Directory the report files are written to
    #[arg(long, default_value = RunConfig::DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// TOML configuration file (defaults to ./persona.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let reporter = ErrorReporter::new();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", reporter.report_error(&e));
            return ExitCode::FAILURE;
        }
    };

    match cli.url {
        Some(url) => {
            let request = RunRequest {
                profile_url: url,
                depth: cli.depth,
                model: cli.model,
                output_dir: cli.output,
            };
            match run_cli(&config, &request) {
                Ok((outcome, paths)) => {
                    print_summary(&outcome, &paths);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{}", reporter.report_error(&e));
                    ExitCode::FAILURE
                }
            }
        }
        None => match run_gui(config, cli.output) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Application error: {:#}", e);
                eprintln!("{:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_cli(
    config: &AppConfig,
    request: &RunRequest,
) -> Result<(AnalysisOutcome, ArtifactPaths), CoreError> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(pipeline::execute(config, request))
}

fn print_summary(outcome: &AnalysisOutcome, paths: &ArtifactPaths) {
    let preview = outcome.preview(PREVIEW_CHARS);
    let truncated = preview.len() < outcome.text_report.len();

    println!("Profile for u/{} saved to:", outcome.meta.username);
    println!("  {}", paths.text.display());
    println!("  {}", paths.structured.display());
    println!();
    println!("Preview:");
    println!("{}{}", preview, if truncated { "..." } else { "" });
    println!();
    println!("Statistics:");
    println!("  Posts analyzed: {}", outcome.meta.post_count);
    println!("  Comments analyzed: {}", outcome.meta.comment_count);
    println!("  Model: {}", outcome.meta.model);
    println!(
        "  Quotes: {} ({} unverified)",
        outcome.profile.quotes.len(),
        outcome.profile.unverified_quotes().count()
    );
    if !outcome.profile.warnings.is_empty() {
        println!("  Parse warnings: {}", outcome.profile.warnings.len());
    }
}

fn run_gui(config: AppConfig, output_dir: PathBuf) -> anyhow::Result<()> {
    info!("Starting {}", gui::TITLE);

    let flags = GuiFlags {
        config: Arc::new(config),
        output_dir,
    };
    let settings = Settings {
        window: iced::window::Settings {
            size: Size::new(1000.0, 800.0),
            min_size: Some(Size::new(700.0, 500.0)),
            ..Default::default()
        },
        ..Settings::with_flags(flags)
    };

    PersonaApp::run(settings).context("desktop UI failed")
}

struct GuiFlags {
    config: Arc<AppConfig>,
    output_dir: PathBuf,
}

struct PersonaApp {
    app: App,
}

impl Application for PersonaApp {
    type Message = gui::Message;
    type Theme = iced::Theme;
    type Executor = iced::executor::Default;
    type Flags = GuiFlags;

    fn new(flags: Self::Flags) -> (Self, Command<Self::Message>) {
        info!("Initializing application");
        (
            Self {
                app: App::new(flags.config, flags.output_dir),
            },
            Command::none(),
        )
    }

    fn title(&self) -> String {
        gui::TITLE.to_string()
    }

    fn update(&mut self, message: Self::Message) -> Command<Self::Message> {
        self.app.update(message)
    }

    fn view(&self) -> iced::Element<Self::Message> {
        self.app.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["persona-digest", "--url", "https://reddit.com/u/kojied"])
            .unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://reddit.com/u/kojied"));
        assert_eq!(cli.depth, 100);
        assert_eq!(cli.model, "llama3-70b-8192");
        assert_eq!(cli.output, PathBuf::from("output"));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_negative_depth_reaches_validation() {
        let cli = Cli::try_parse_from(["persona-digest", "--url", "u/kojied", "--depth", "-3"])
            .unwrap();
        assert_eq!(cli.depth, -3);

        let request = RunRequest {
            profile_url: cli.url.unwrap(),
            depth: cli.depth,
            model: cli.model,
            output_dir: cli.output,
        };
        let err = request.to_run_config().unwrap_err();
        assert!(ErrorReporter::new()
            .with_error_reporting(false)
            .report_error(&err)
            .starts_with("InvalidInputError: "));
    }

    #[test]
    fn test_ui_when_url_missing() {
        let cli = Cli::try_parse_from(["persona-digest"]).unwrap();
        assert!(cli.url.is_none());
    }
}
