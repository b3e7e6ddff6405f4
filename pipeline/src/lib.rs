use llm_interface::{GroqProvider, LlmProvider, PromptBuilder};
use persona_core::{
    AppConfig, ContentItem, CoreError, PersonaProfile, ReportMeta, RunConfig,
};
use reddit_client::{fetch_content, parse_profile_identifier, ContentSource, RedditClient};
use report::ArtifactPaths;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Raw inputs from either entry point, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub profile_url: String,
    pub depth: i64,
    pub model: String,
    pub output_dir: PathBuf,
}

impl RunRequest {
    /// Validate everything that can be checked without the network.
    pub fn to_run_config(&self) -> Result<RunConfig, CoreError> {
        let username = parse_profile_identifier(&self.profile_url)?;
        RunConfig::new(username, self.depth, &self.model, self.output_dir.clone())
    }
}

/// Result of one analysis, ready to be shown or written out.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub items: Vec<ContentItem>,
    pub profile: PersonaProfile,
    pub meta: ReportMeta,
    pub text_report: String,
    pub structured_report: String,
}

impl AnalysisOutcome {
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.text_report.char_indices().nth(max_chars) {
            Some((end, _)) => &self.text_report[..end],
            None => &self.text_report,
        }
    }

    pub async fn save(&self, output_dir: &std::path::Path) -> Result<ArtifactPaths, CoreError> {
        report::write_artifacts(
            output_dir,
            &self.meta.username,
            &self.text_report,
            &self.structured_report,
        )
        .await
    }
}

/// Fetch, prompt, infer, parse and render, strictly in that order.
pub struct Pipeline<S, L> {
    source: S,
    llm: L,
    prompt: PromptBuilder,
}

impl<S: ContentSource, L: LlmProvider> Pipeline<S, L> {
    pub fn new(source: S, llm: L, prompt: PromptBuilder) -> Self {
        Self {
            source,
            llm,
            prompt,
        }
    }

    pub fn llm(&self) -> &L {
        &self.llm
    }

    pub async fn run(&self, config: &RunConfig) -> Result<AnalysisOutcome, CoreError> {
        let started = Instant::now();
        let username = config.profile_identifier.as_str();
        info!(
            username,
            depth = config.depth,
            model = %config.model,
            "Starting analysis"
        );

        let items = fetch_content(&self.source, username, config.depth).await?;
        if items.is_empty() {
            warn!("u/{} has no public posts or comments", username);
            return Err(CoreError::EmptyInput {
                reason: format!("u/{} has no public posts or comments", username),
            });
        }

        let prompt = self.prompt.build_prompt(&items, username)?;
        debug!(chars = prompt.chars().count(), "Prompt built");

        let raw = self.llm.complete(&prompt, config.model.as_str()).await?;
        let profile = report::parse(&raw, &items);
        if !profile.is_complete() {
            for warning in &profile.warnings {
                warn!("Partial profile: {}", warning);
            }
        }

        let meta = ReportMeta::new(username, config.model, &items);
        let text_report = report::serialize_text(&profile, &meta);
        let structured_report = report::serialize_structured(&profile, &meta)?;

        info!(
            username,
            items = items.len(),
            quotes = profile.quotes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        Ok(AnalysisOutcome {
            items,
            profile,
            meta,
            text_report,
            structured_report,
        })
    }

    /// Run and write both artifacts. Nothing is written when any stage fails.
    pub async fn run_and_save(
        &self,
        config: &RunConfig,
    ) -> Result<(AnalysisOutcome, ArtifactPaths), CoreError> {
        let outcome = self.run(config).await?;
        let paths = outcome.save(&config.output_dir).await?;
        Ok((outcome, paths))
    }
}

impl Pipeline<RedditClient, GroqProvider> {
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        Ok(Self::new(
            RedditClient::from_config(config)?,
            GroqProvider::from_config(config)?,
            PromptBuilder::from_config(&config.prompt),
        ))
    }
}

/// Command-line flow: validate inputs, then credentials, then run and save.
pub async fn execute(
    config: &AppConfig,
    request: &RunRequest,
) -> Result<(AnalysisOutcome, ArtifactPaths), CoreError> {
    let run_config = request.to_run_config()?;
    let pipeline = Pipeline::from_config(config)?;
    pipeline.run_and_save(&run_config).await
}

/// UI flow. Owns its inputs so it can be handed to the UI executor.
pub async fn analyze(
    config: Arc<AppConfig>,
    request: RunRequest,
) -> Result<AnalysisOutcome, CoreError> {
    let run_config = request.to_run_config()?;
    let pipeline = Pipeline::from_config(&config)?;
    pipeline.run(&run_config).await
}
