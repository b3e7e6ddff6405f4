use persona_core::{ContentItem, CoreError, ItemKind, PromptConfig};
use tracing::debug;

pub const SYSTEM_PROMPT: &str = "You are an expert digital behavioral analyst specializing in \
building user personas from social media activity. You analyze communication patterns, \
interests and behavioral indicators, and you only cite evidence that appears in the material \
you are given.";

const ENTRY_SEPARATOR: &str = "\n\n";
const ELLIPSIS: char = '…';

/// Builds the single instruction payload sent to the model.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    char_budget: usize,
    max_item_chars: usize,
}

impl PromptBuilder {
    pub fn new(char_budget: usize, max_item_chars: usize) -> Self {
        Self {
            char_budget,
            max_item_chars,
        }
    }

    pub fn from_config(config: &PromptConfig) -> Self {
        Self::new(config.char_budget, config.max_item_chars)
    }

    /// `items` must be most-recent-first. Items that do not fit the budget are
    /// dropped whole, oldest first.
    pub fn build_prompt(
        &self,
        items: &[ContentItem],
        profile_identifier: &str,
    ) -> Result<String, CoreError> {
        if items.is_empty() {
            return Err(CoreError::EmptyInput {
                reason: format!("no posts or comments to analyze for u/{}", profile_identifier),
            });
        }

        let mut entries = Vec::with_capacity(items.len());
        let mut used = 0usize;
        let mut posts = 0usize;
        for item in items {
            let entry = self.render_item(item);
            let cost = entry.chars().count()
                + if entries.is_empty() {
                    0
                } else {
                    ENTRY_SEPARATOR.len()
                };
            if used + cost > self.char_budget {
                break;
            }
            used += cost;
            if item.kind == ItemKind::Post {
                posts += 1;
            }
            entries.push(entry);
        }

        if entries.is_empty() {
            return Err(CoreError::invalid_input(format!(
                "prompt budget of {} characters cannot fit a single item",
                self.char_budget
            )));
        }

        let omitted = items.len() - entries.len();
        debug!(
            included = entries.len(),
            omitted,
            chars = used,
            "Prompt content selected"
        );

        Ok(render_template(
            profile_identifier,
            posts,
            entries.len() - posts,
            omitted,
            &entries.join(ENTRY_SEPARATOR),
        ))
    }

    /// `[POST abc123] r/rust (2024-01-31): text`
    pub fn render_item(&self, item: &ContentItem) -> String {
        format!(
            "[{} {}] r/{} ({}): {}",
            item.kind.label(),
            item.id,
            item.subreddit,
            item.timestamp.format("%Y-%m-%d"),
            clip(&item.text, self.max_item_chars)
        )
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::from_config(&PromptConfig::default())
    }
}

/// Collapse whitespace and cut to `max_chars`, on a char boundary.
fn clip(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut clipped: String = flat.chars().take(max_chars).collect();
    clipped.push(ELLIPSIS);
    clipped
}

fn render_template(
    username: &str,
    posts: usize,
    comments: usize,
    omitted: usize,
    content: &str,
) -> String {
    format!(
        "Analyze the following Reddit activity and build a digital personality profile.

User: u/{username}
Posts included: {posts}
Comments included: {comments}
Items omitted to fit the request size: {omitted}

Each item is tagged [POST <id>] or [COMMENT <id>], followed by its subreddit and date.

Content to analyze:
{content}

Respond using exactly these section headings, each on its own line and followed by a colon:

Core Interests:
- <interest> (Evidence: \"<exact quote>\" - Source: <item id>)

Personality Traits:
- <trait> (Evidence: \"<exact quote>\" - Source: <item id>)

Communication Tone:
<one short paragraph on writing style and tone>

Core Values:
- <value or belief> (Evidence: \"<exact quote>\" - Source: <item id>)

Engagement Pattern:
<one short paragraph on how and where the user engages>

Notable Quotes:
- \"<exact quote>\" - Source: <item id>

Guidelines:
- Quote the analyzed content verbatim and keep quotes short.
- Cite only ids that appear in the content above, without the POST/COMMENT label.
- Base every insight on evidence; write \"Not determined\" when the content gives no basis.
- Stay objective and professional."
    )
}
