use iced::widget::{button, column, container, pick_list, row, scrollable, text, text_input, Column};
use iced::{Command, Element, Length, Theme};
use persona_core::{
    AppConfig, CoreError, ErrorReporter, ModelName, PersonaProfile, RunConfig, Section,
    ENV_GROQ_API_KEY, ENV_REDDIT_CLIENT_ID, ENV_REDDIT_CLIENT_SECRET,
};
use pipeline::{AnalysisOutcome, RunRequest};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub const TITLE: &str = "Reddit Persona Digest";

const MODELS: &[ModelName] = &ModelName::ALL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Text,
    Structured,
}

#[derive(Debug, Clone)]
pub enum Message {
    ProfileUrlChanged(String),
    DepthChanged(String),
    ModelSelected(ModelName),
    Analyze,
    AnalysisFinished(Result<Arc<AnalysisOutcome>, String>),
    Download(Artifact),
    Saved(Result<PathBuf, String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Running(String),
    Done(String),
    Failed(String),
}

pub struct App {
    config: Arc<AppConfig>,
    output_dir: PathBuf,
    profile_url: String,
    depth: String,
    model: ModelName,
    status: Status,
    outcome: Option<Arc<AnalysisOutcome>>,
}

impl App {
    pub fn new(config: Arc<AppConfig>, output_dir: PathBuf) -> Self {
        Self {
            config,
            output_dir,
            profile_url: String::new(),
            depth: RunConfig::DEFAULT_DEPTH.to_string(),
            model: ModelName::default(),
            status: Status::Idle,
            outcome: None,
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, Status::Running(_))
    }

    pub fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::ProfileUrlChanged(url) => {
                self.profile_url = url;
                Command::none()
            }
            Message::DepthChanged(depth) => {
                self.depth = depth;
                Command::none()
            }
            Message::ModelSelected(model) => {
                self.model = model;
                Command::none()
            }
            Message::Analyze => self.start_analysis(),
            Message::AnalysisFinished(Ok(outcome)) => {
                info!(
                    username = %outcome.meta.username,
                    items = outcome.meta.item_count,
                    "Analysis finished"
                );
                self.status = Status::Done(format!(
                    "Analyzed {} items for u/{}",
                    outcome.meta.item_count, outcome.meta.username
                ));
                self.outcome = Some(outcome);
                Command::none()
            }
            Message::AnalysisFinished(Err(message)) => {
                self.status = Status::Failed(message);
                Command::none()
            }
            Message::Download(artifact) => self.download(artifact),
            Message::Saved(Ok(path)) => {
                self.status = Status::Done(format!("Saved {}", path.display()));
                Command::none()
            }
            Message::Saved(Err(message)) => {
                self.status = Status::Failed(message);
                Command::none()
            }
        }
    }

    fn start_analysis(&mut self) -> Command<Message> {
        if self.is_running() {
            return Command::none();
        }

        let depth = match self.depth.trim().parse::<i64>() {
            Ok(depth) => depth,
            Err(_) => {
                let err = CoreError::invalid_input(format!(
                    "depth must be a positive integer, got '{}'",
                    self.depth.trim()
                ));
                self.status = Status::Failed(ErrorReporter::new().report_error(&err));
                return Command::none();
            }
        };

        let request = RunRequest {
            profile_url: self.profile_url.trim().to_string(),
            depth,
            model: self.model.as_str().to_string(),
            output_dir: self.output_dir.clone(),
        };
        if let Err(err) = request.to_run_config() {
            self.status = Status::Failed(ErrorReporter::new().report_error(&err));
            return Command::none();
        }

        self.outcome = None;
        self.status = Status::Running(format!(
            "Fetching activity and generating a profile with {}...",
            self.model
        ));

        Command::perform(
            pipeline::analyze(Arc::clone(&self.config), request),
            |result| {
                Message::AnalysisFinished(
                    result
                        .map(Arc::new)
                        .map_err(|e| ErrorReporter::new().report_error(&e)),
                )
            },
        )
    }

    fn download(&mut self, artifact: Artifact) -> Command<Message> {
        let Some(outcome) = self.outcome.as_ref() else {
            warn!("Download requested before any analysis finished");
            return Command::none();
        };
        let dir = self.output_dir.clone();
        let username = outcome.meta.username.clone();
        let contents = match artifact {
            Artifact::Text => outcome.text_report.clone(),
            Artifact::Structured => outcome.structured_report.clone(),
        };
        Command::perform(
            save_artifact(dir, username, artifact, contents),
            Message::Saved,
        )
    }

    pub fn view(&self) -> Element<Message, Theme> {
        let title: Element<Message, Theme> = text(TITLE).size(24).into();

        let running = self.is_running();
        let analyze = button("Analyze").on_press_maybe((!running).then_some(Message::Analyze));

        let form: Element<Message, Theme> = column![
            text_input("https://www.reddit.com/user/username/", &self.profile_url)
                .on_input(Message::ProfileUrlChanged)
                .on_submit(Message::Analyze)
                .padding(8),
            row![
                text("Depth").size(14),
                text_input("100", &self.depth)
                    .on_input(Message::DepthChanged)
                    .width(Length::Fixed(100.0)),
                text("Model").size(14),
                pick_list(MODELS, Some(self.model), Message::ModelSelected),
                analyze,
            ]
            .spacing(10),
            text(credential_status(&self.config)).size(12),
        ]
        .spacing(10)
        .into();

        let status: Element<Message, Theme> = match &self.status {
            Status::Idle => text("Enter a profile URL to begin.").size(14).into(),
            Status::Running(message) | Status::Done(message) => text(message).size(14).into(),
            Status::Failed(message) => text(format!("Error: {}", message)).size(14).into(),
        };

        let mut content = Column::new().spacing(20).push(title).push(form).push(status);
        if let Some(outcome) = &self.outcome {
            content = content.push(
                row![
                    button("Download report").on_press(Message::Download(Artifact::Text)),
                    button("Download JSON").on_press(Message::Download(Artifact::Structured)),
                ]
                .spacing(10),
            );
            content = content.push(profile_view(&outcome.profile));
        }

        container(scrollable(content.padding(20)))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

fn profile_view(profile: &PersonaProfile) -> Element<'_, Message, Theme> {
    let mut sections = Column::new().spacing(16);
    for section in Section::ALL {
        let mut body = Column::new().spacing(4).push(text(section.title()).size(18));
        body = match section {
            Section::Interests => push_list(body, &profile.interests),
            Section::Traits => push_list(body, &profile.traits),
            Section::Values => push_list(body, &profile.values),
            Section::Tone => body.push(text(&profile.tone_description).size(14)),
            Section::EngagementPattern => body.push(text(&profile.engagement_pattern).size(14)),
            Section::Quotes => {
                if profile.quotes.is_empty() {
                    body.push(text(persona_core::NOT_DETERMINED).size(14))
                } else {
                    profile.quotes.iter().fold(body, |body, quote| {
                        let marker = if quote.verified { "" } else { " [unverified]" };
                        body.push(text(format!("\"{}\"{}", quote.text, marker)).size(14))
                    })
                }
            }
        };
        sections = sections.push(body);
    }
    sections.into()
}

fn push_list<'a>(body: Column<'a, Message>, entries: &[String]) -> Column<'a, Message> {
    entries
        .iter()
        .fold(body, |body, entry| body.push(text(format!("- {}", entry)).size(14)))
}

fn credential_status(config: &AppConfig) -> String {
    let reddit = if config.reddit_configured() {
        "configured".to_string()
    } else {
        format!("missing ({}, {})", ENV_REDDIT_CLIENT_ID, ENV_REDDIT_CLIENT_SECRET)
    };
    let llm = if config.llm_configured() {
        "configured".to_string()
    } else {
        format!("missing ({})", ENV_GROQ_API_KEY)
    };
    format!("Reddit credentials: {}  |  Groq API key: {}", reddit, llm)
}

pub async fn save_artifact(
    dir: PathBuf,
    username: String,
    artifact: Artifact,
    contents: String,
) -> Result<PathBuf, String> {
    let written = match artifact {
        Artifact::Text => report::write_text_report(&dir, &username, &contents).await,
        Artifact::Structured => report::write_structured_report(&dir, &username, &contents).await,
    };
    written.map_err(|e| ErrorReporter::new().report_error(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_core::Secret;

    fn app() -> App {
        App::new(Arc::new(AppConfig::default()), PathBuf::from("output"))
    }

    #[test]
    fn test_defaults() {
        let app = app();
        assert_eq!(app.depth, "100");
        assert_eq!(app.model, ModelName::Llama3_70b);
        assert_eq!(app.status(), &Status::Idle);
        assert!(!app.is_running());
    }

    #[test]
    fn test_invalid_depth_reported_without_running() {
        let mut app = app();
        app.update(Message::ProfileUrlChanged("u/kojied".to_string()));
        app.update(Message::DepthChanged("lots".to_string()));
        app.update(Message::Analyze);

        match app.status() {
            Status::Failed(message) => assert!(message.starts_with("InvalidInputError: ")),
            other => panic!("unexpected status {:?}", other),
        }
        assert!(!app.is_running());
    }

    #[test]
    fn test_bad_profile_url_reported() {
        let mut app = app();
        app.update(Message::ProfileUrlChanged("https://example.com/nope".to_string()));
        app.update(Message::Analyze);
        assert!(matches!(app.status(), Status::Failed(_)));
    }

    #[test]
    fn test_analyze_marks_running_and_ignores_repeats() {
        let mut app = app();
        app.update(Message::ProfileUrlChanged("https://www.reddit.com/user/kojied/".to_string()));
        app.update(Message::ModelSelected(ModelName::Mixtral8x7b));
        app.update(Message::Analyze);
        assert!(app.is_running());

        let before = app.status().clone();
        app.update(Message::Analyze);
        assert_eq!(app.status(), &before);

        app.update(Message::AnalysisFinished(Err(
            "ProfileNotFoundError: not found".to_string()
        )));
        assert!(!app.is_running());
        assert_eq!(
            app.status(),
            &Status::Failed("ProfileNotFoundError: not found".to_string())
        );
    }

    #[test]
    fn test_credential_status_never_shows_values() {
        let mut config = AppConfig::default();
        config.reddit.client_id = Some("my-client".to_string());
        config.reddit.client_secret = Some(Secret::new("super-secret"));
        let line = credential_status(&config);
        assert!(line.contains("Reddit credentials: configured"));
        assert!(line.contains("Groq API key: missing (GROQ_API_KEY)"));
        assert!(!line.contains("super-secret"));
        assert!(!line.contains("my-client"));
    }

    #[tokio::test]
    async fn test_save_artifact_writes_into_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_artifact(
            dir.path().to_path_buf(),
            "kojied".to_string(),
            Artifact::Structured,
            "{}".to_string(),
        )
        .await
        .unwrap();
        assert!(path.ends_with("kojied_profile_data.json"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{}");
    }
}
