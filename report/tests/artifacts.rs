use chrono::{TimeZone, Utc};
use persona_core::{ContentItem, ErrorExt, ErrorKind, ItemKind, ModelName, ReportMeta};
use report::{
    parse, parse_structured, serialize_structured, serialize_text, write_artifacts,
    write_text_report,
};

fn items() -> Vec<ContentItem> {
    vec![ContentItem {
        kind: ItemKind::Comment,
        id: "c1".to_string(),
        text: "Tabs versus spaces is settled: spaces.".to_string(),
        subreddit: "programming".to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 2, 2, 8, 0, 0).unwrap(),
        permalink: "https://reddit.com/r/programming/comments/x/y/c1/".to_string(),
        score: 3,
    }]
}

const RESPONSE: &str = "Core Interests:\n- Code style (Evidence: \"Tabs versus spaces is settled\" - Source: t1_c1)\n\nPersonality Traits:\n- Opinionated\n\nCommunication Tone:\nBlunt.\n\nCore Values:\n- Consistency\n\nEngagement Pattern:\nOccasional comments.\n\nNotable Quotes:\n- \"Tabs versus spaces is settled: spaces.\" - Source: c1\n";

#[tokio::test]
async fn test_write_artifacts_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("nested").join("output");

    let items = items();
    let profile = parse(RESPONSE, &items);
    assert!(profile.is_complete());

    let meta = ReportMeta::new("kojied", ModelName::default(), &items);
    let text = serialize_text(&profile, &meta);
    let json = serialize_structured(&profile, &meta).unwrap();

    let paths = write_artifacts(&out_dir, "kojied", &text, &json)
        .await
        .unwrap();

    assert!(paths.text.ends_with("kojied_digital_profile.txt"));
    assert!(paths.structured.ends_with("kojied_profile_data.json"));

    let written_text = std::fs::read_to_string(&paths.text).unwrap();
    assert_eq!(written_text, text);
    assert!(written_text.contains("Profile Generated:"));

    let written_json = std::fs::read_to_string(&paths.structured).unwrap();
    let report = parse_structured(&written_json).unwrap();
    assert_eq!(report.meta.username, "kojied");
    assert_eq!(report.profile, profile);
    assert!(report.profile.quotes.iter().all(|q| q.verified));
}

#[tokio::test]
async fn test_rewrite_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    write_text_report(dir.path(), "kojied", "first").await.unwrap();
    let path = write_text_report(dir.path(), "kojied", "second")
        .await
        .unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
}

#[tokio::test]
async fn test_unwritable_directory_is_output_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "file").unwrap();

    let err = write_artifacts(&blocker, "kojied", "text", "{}")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Output);
}
