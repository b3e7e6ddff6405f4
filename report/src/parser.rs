use persona_core::{
    ContentItem, PartialParseWarning, PersonaProfile, Quote, Section, NOT_DETERMINED,
};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tracing::{debug, error, warn};

/// Ordered keyword rules, searched for in the normalized header text. The
/// first rule that matches wins, so "Quotes on writing style" is a quotes
/// header and a bare "Patterns" falls through to engagement last.
const HEADER_RULES: &[(&str, Section)] = &[
    (r"\bquot(e|es|ations?)\b", Section::Quotes),
    (r"\b(interests?|passions?|hobby|hobbies)\b", Section::Interests),
    (r"\b(personality|traits?|insights?|character)\b", Section::Traits),
    (r"\b(values?|beliefs?|perspectives?|principles?)\b", Section::Values),
    (r"\b(engagement|behaviou?r\w*|activity|habits?)\b", Section::EngagementPattern),
    (r"\b(tone|style|communication|writing|voice)\b", Section::Tone),
    (r"\bpatterns?\b", Section::EngagementPattern),
];

const QUOTE_PATTERN: &str = r#"["“]([^"“”]+)["”]"#;
const SOURCE_PATTERN: &str = r"(?i)\bsource\s*:?\s*\[?\s*(?:(?:post|comment)\s+)?([a-z0-9_]+)";
const BRACKET_ID_PATTERN: &str = r"\[(?:(?:POST|COMMENT)\s+)?([A-Za-z0-9_]+)\]";
const EVIDENCE_PATTERN: &str = r"(?i)\s*(?:\(|[-–—]\s)\s*(?:evidence|source)\b.*$";
const BULLET_PATTERN: &str = r"^(?:[-*•+]|\d+[.)])\s+";
const NUMBERED_PATTERN: &str = r"^\d+[.)]\s";

/// Quotes shorter than this are treated as noise.
const MIN_QUOTE_CHARS: usize = 3;
/// Unsourced quotes are matched against item text only when at least this long.
const MIN_TEXT_MATCH_CHARS: usize = 10;
/// Lines whose header text has more words than this are never headers.
const MAX_HEADER_WORDS: usize = 6;

static PARSER: OnceLock<Result<SectionParser, regex::Error>> = OnceLock::new();

/// Parse a raw model response into a profile. Never fails: missing or empty
/// sections are filled with placeholders and reported as warnings.
pub fn parse(raw_response: &str, items: &[ContentItem]) -> PersonaProfile {
    match PARSER.get_or_init(SectionParser::new) {
        Ok(parser) => parser.parse(raw_response, items),
        Err(e) => {
            error!("Section rules failed to compile: {}", e);
            assemble(Collected::default(), items)
        }
    }
}

struct HeaderRule {
    pattern: Regex,
    section: Section,
}

#[derive(Debug, PartialEq)]
enum LineKind {
    Header(Section, Option<String>),
    UnknownHeader(String),
    Content,
}

enum Target {
    Preamble,
    Known(Section),
    Unmatched,
}

#[derive(Debug, Clone, PartialEq)]
struct RawQuote {
    text: String,
    source: Option<String>,
}

/// Everything pulled out of the response before placeholders and
/// verification are applied. A section key is present once its header was seen.
#[derive(Default)]
struct Collected {
    sections: HashMap<Section, Vec<String>>,
    quotes: Vec<RawQuote>,
}

pub(crate) struct SectionParser {
    rules: Vec<HeaderRule>,
    quote: Regex,
    source: Regex,
    bracket_id: Regex,
    evidence: Regex,
    bullet: Regex,
    numbered: Regex,
}

impl SectionParser {
    pub(crate) fn new() -> Result<Self, regex::Error> {
        let rules = HEADER_RULES
            .iter()
            .map(|(pattern, section)| {
                Ok(HeaderRule {
                    pattern: Regex::new(pattern)?,
                    section: *section,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            rules,
            quote: Regex::new(QUOTE_PATTERN)?,
            source: Regex::new(SOURCE_PATTERN)?,
            bracket_id: Regex::new(BRACKET_ID_PATTERN)?,
            evidence: Regex::new(EVIDENCE_PATTERN)?,
            bullet: Regex::new(BULLET_PATTERN)?,
            numbered: Regex::new(NUMBERED_PATTERN)?,
        })
    }

    fn parse(&self, raw_response: &str, items: &[ContentItem]) -> PersonaProfile {
        if raw_response.trim().is_empty() {
            warn!("Model response was empty");
            let mut profile = assemble(Collected::default(), items);
            profile.warnings.insert(0, PartialParseWarning::EmptyResponse);
            return profile;
        }

        let mut collected = Collected::default();
        let mut target = Target::Preamble;
        let mut ignored = 0usize;

        for line in raw_response.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match self.classify(line) {
                LineKind::Header(section, rest) => {
                    collected.sections.entry(section).or_default();
                    target = Target::Known(section);
                    if let Some(rest) = rest {
                        self.collect(section, &rest, &mut collected);
                    }
                }
                LineKind::UnknownHeader(name) => {
                    debug!(header = %name, "Ignoring unrecognised section");
                    target = Target::Unmatched;
                }
                LineKind::Content => match target {
                    Target::Known(section) => self.collect(section, line, &mut collected),
                    Target::Preamble | Target::Unmatched => {
                        let cited = self.cited_quotes(line);
                        if cited.is_empty() {
                            ignored += 1;
                        } else {
                            collected.quotes.extend(cited);
                        }
                    }
                },
            }
        }

        if ignored > 0 {
            debug!(lines = ignored, "Lines outside known sections ignored");
        }

        assemble(collected, items)
    }

    /// Only markdown headings, fully bold lines and short `Label:` lines are
    /// header candidates. Bullets are always content, and a numbered line is a
    /// header only when nothing follows its colon.
    fn classify(&self, line: &str) -> LineKind {
        let numbered = self.numbered.is_match(line);
        if self.bullet.is_match(line) && !numbered {
            return LineKind::Content;
        }

        let is_heading = line.starts_with('#');
        let fully_bold = line.starts_with("**") && line.trim_end_matches(':').ends_with("**");
        let unmarked = line.trim_start_matches('#').replace("**", "").replace("__", "");
        let (head, rest) = match unmarked.split_once(':') {
            Some((head, rest)) => (head, Some(rest.trim())),
            None => (unmarked.as_str(), None),
        };

        if !(is_heading || fully_bold || rest.is_some()) {
            return LineKind::Content;
        }

        let key = normalize_header(head);
        if key.is_empty() || key.split_whitespace().count() > MAX_HEADER_WORDS {
            return LineKind::Content;
        }

        let rest = rest.filter(|r| !r.is_empty()).map(str::to_string);
        if numbered && rest.is_some() {
            return LineKind::Content;
        }

        if let Some(section) = self.match_section(&key) {
            return LineKind::Header(section, rest);
        }

        if !numbered && rest.is_none() {
            return LineKind::UnknownHeader(key);
        }

        LineKind::Content
    }

    fn match_section(&self, key: &str) -> Option<Section> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(key))
            .map(|rule| rule.section)
    }

    fn collect(&self, section: Section, line: &str, collected: &mut Collected) {
        let quotes = self.extract_quotes(line);
        let entry = self.clean_entry(line);

        if section == Section::Quotes && quotes.is_empty() && !is_placeholder(&entry) {
            collected.quotes.push(RawQuote {
                text: entry.clone(),
                source: self.find_source(line),
            });
        }
        collected.quotes.extend(quotes);

        if !is_placeholder(&entry) {
            collected.sections.entry(section).or_default().push(entry);
        }
    }

    /// Quotes on a line outside any known section, kept only when the line
    /// cites them as evidence or names a source.
    fn cited_quotes(&self, line: &str) -> Vec<RawQuote> {
        let is_evidence = self.evidence.is_match(line);
        self.extract_quotes(line)
            .into_iter()
            .filter(|quote| is_evidence || quote.source.is_some())
            .collect()
    }

    fn extract_quotes(&self, line: &str) -> Vec<RawQuote> {
        let spans: Vec<_> = self
            .quote
            .captures_iter(line)
            .filter_map(|caps| Some((caps.get(0)?, caps.get(1)?)))
            .collect();

        spans
            .iter()
            .enumerate()
            .filter_map(|(i, (whole, inner))| {
                let text = inner.as_str().trim();
                if text.chars().count() < MIN_QUOTE_CHARS {
                    return None;
                }
                let tail_end = spans
                    .get(i + 1)
                    .map(|(next, _)| next.start())
                    .unwrap_or(line.len());
                Some(RawQuote {
                    text: text.to_string(),
                    source: self.find_source(&line[whole.end()..tail_end]),
                })
            })
            .collect()
    }

    fn find_source(&self, text: &str) -> Option<String> {
        self.source
            .captures(text)
            .or_else(|| self.bracket_id.captures(text))
            .and_then(|caps| caps.get(1))
            .and_then(|m| normalize_item_id(m.as_str()))
    }

    /// Strip list markers, emphasis and a trailing evidence clause.
    fn clean_entry(&self, line: &str) -> String {
        let line = self.bullet.replace(line, "");
        let line = line.replace("**", "");
        let line = self.evidence.replace(&line, "");
        line.trim()
            .trim_end_matches(|c: char| c == ',' || c == ';' || c == '-')
            .trim()
            .to_string()
    }
}

fn assemble(collected: Collected, items: &[ContentItem]) -> PersonaProfile {
    let mut warnings = Vec::new();

    let interests = list_section(&collected, Section::Interests, &mut warnings);
    let traits = list_section(&collected, Section::Traits, &mut warnings);
    let tone_description = text_section(&collected, Section::Tone, &mut warnings);
    let values = list_section(&collected, Section::Values, &mut warnings);
    let engagement_pattern = text_section(&collected, Section::EngagementPattern, &mut warnings);
    section_warning(&collected, Section::Quotes, &mut warnings);
    let quotes = verify_quotes(collected.quotes, items, &mut warnings);

    PersonaProfile {
        interests,
        traits,
        tone_description,
        values,
        engagement_pattern,
        quotes,
        warnings,
    }
}

/// Records a warning and returns the section entries when there are any.
fn section_warning<'a>(
    collected: &'a Collected,
    section: Section,
    warnings: &mut Vec<PartialParseWarning>,
) -> Option<&'a Vec<String>> {
    match collected.sections.get(&section) {
        None => {
            warnings.push(PartialParseWarning::MissingSection { section });
            None
        }
        Some(entries) if entries.is_empty() => {
            warnings.push(PartialParseWarning::EmptySection { section });
            None
        }
        Some(entries) => Some(entries),
    }
}

fn list_section(
    collected: &Collected,
    section: Section,
    warnings: &mut Vec<PartialParseWarning>,
) -> Vec<String> {
    section_warning(collected, section, warnings)
        .cloned()
        .unwrap_or_else(|| vec![NOT_DETERMINED.to_string()])
}

fn text_section(
    collected: &Collected,
    section: Section,
    warnings: &mut Vec<PartialParseWarning>,
) -> String {
    section_warning(collected, section, warnings)
        .map(|entries| entries.join(" "))
        .unwrap_or_else(|| NOT_DETERMINED.to_string())
}

fn verify_quotes(
    raw: Vec<RawQuote>,
    items: &[ContentItem],
    warnings: &mut Vec<PartialParseWarning>,
) -> Vec<Quote> {
    let ids: HashSet<&str> = items.iter().map(|item| item.id.as_str()).collect();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut quotes: Vec<Quote> = Vec::new();

    for RawQuote { text, source } in raw {
        let key = normalize_text(&text);
        if key.is_empty() {
            continue;
        }

        let matched = match source.as_deref() {
            Some(id) if ids.contains(id) => Some(id.to_string()),
            _ => find_item_by_text(items, &key),
        };
        let quote = match matched {
            Some(id) => Quote {
                text,
                source_item_id: Some(id),
                verified: true,
            },
            None => Quote {
                text,
                source_item_id: source,
                verified: false,
            },
        };

        match seen.get(&key) {
            Some(&index) => {
                if quote.verified && !quotes[index].verified {
                    quotes[index] = quote;
                }
            }
            None => {
                seen.insert(key, quotes.len());
                quotes.push(quote);
            }
        }
    }

    for quote in quotes.iter().filter(|q| !q.verified) {
        debug!(source = ?quote.source_item_id, "Quote not traced to a fetched item");
        warnings.push(PartialParseWarning::UnverifiedQuote {
            text: quote.text.clone(),
        });
    }

    quotes
}

fn find_item_by_text(items: &[ContentItem], key: &str) -> Option<String> {
    if key.chars().count() < MIN_TEXT_MATCH_CHARS {
        return None;
    }
    items
        .iter()
        .find(|item| normalize_text(&item.text).contains(key))
        .map(|item| item.id.clone())
}

/// `t1_abc` and `t3_abc` are fullnames of the bare ids we fetch. A prefix
/// with nothing after it is no id at all.
fn normalize_item_id(id: &str) -> Option<String> {
    let lower = id.to_ascii_lowercase();
    let bare = lower
        .strip_prefix("t1_")
        .or_else(|| lower.strip_prefix("t3_"))
        .unwrap_or(&lower);
    (!bare.is_empty()).then(|| bare.to_string())
}

fn normalize_header(head: &str) -> String {
    head.trim_start_matches(|c: char| !c.is_alphabetic())
        .trim_end_matches(|c: char| !c.is_alphanumeric())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn normalize_text(text: &str) -> String {
    text.replace(['’', '‘'], "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_placeholder(entry: &str) -> bool {
    let entry = entry.trim_end_matches('.').trim();
    entry.is_empty() || entry.eq_ignore_ascii_case(NOT_DETERMINED)
}
