use persona_core::{CoreError, PersonaProfile, ReportMeta, Section, NOT_DETERMINED};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// The JSON artifact: run metadata followed by the profile fields, flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredReport {
    #[serde(flatten)]
    pub meta: ReportMeta,
    #[serde(flatten)]
    pub profile: PersonaProfile,
}

pub fn serialize_text(profile: &PersonaProfile, meta: &ReportMeta) -> String {
    let mut out = String::new();
    let title = format!("Digital Profile: u/{}", meta.username);
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));

    for section in Section::ALL {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", section.title());
        let _ = writeln!(out, "{}", "-".repeat(section.title().len()));
        match section {
            Section::Interests => write_list(&mut out, &profile.interests),
            Section::Traits => write_list(&mut out, &profile.traits),
            Section::Values => write_list(&mut out, &profile.values),
            Section::Tone => {
                let _ = writeln!(out, "{}", profile.tone_description);
            }
            Section::EngagementPattern => {
                let _ = writeln!(out, "{}", profile.engagement_pattern);
            }
            Section::Quotes => write_quotes(&mut out, profile),
        }
    }

    if !profile.warnings.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Notes");
        let _ = writeln!(out, "-----");
        for warning in &profile.warnings {
            let _ = writeln!(out, "- {}", warning);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Analyzed {} items ({} posts, {} comments) with {}",
        meta.item_count, meta.post_count, meta.comment_count, meta.model
    );
    let _ = write!(
        out,
        "Profile Generated: {}",
        meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out
}

fn write_list(out: &mut String, entries: &[String]) {
    for entry in entries {
        let _ = writeln!(out, "- {}", entry);
    }
}

fn write_quotes(out: &mut String, profile: &PersonaProfile) {
    if profile.quotes.is_empty() {
        let _ = writeln!(out, "- {}", NOT_DETERMINED);
        return;
    }
    for quote in &profile.quotes {
        match (&quote.source_item_id, quote.verified) {
            (Some(id), true) => {
                let _ = writeln!(out, "- \"{}\" (source: {})", quote.text, id);
            }
            _ => {
                let _ = writeln!(out, "- \"{}\" [unverified]", quote.text);
            }
        }
    }
}

pub fn serialize_structured(
    profile: &PersonaProfile,
    meta: &ReportMeta,
) -> Result<String, CoreError> {
    let report = StructuredReport {
        meta: meta.clone(),
        profile: profile.clone(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn parse_structured(json: &str) -> Result<StructuredReport, CoreError> {
    Ok(serde_json::from_str(json)?)
}
