use persona_core::CoreError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

const TEXT_SUFFIX: &str = "_digital_profile.txt";
const STRUCTURED_SUFFIX: &str = "_profile_data.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub text: PathBuf,
    pub structured: PathBuf,
}

pub fn artifact_paths(dir: &Path, profile_identifier: &str) -> ArtifactPaths {
    let stem = file_stem(profile_identifier);
    ArtifactPaths {
        text: dir.join(format!("{}{}", stem, TEXT_SUFFIX)),
        structured: dir.join(format!("{}{}", stem, STRUCTURED_SUFFIX)),
    }
}

/// Usernames are already filename-safe; anything else is replaced.
fn file_stem(profile_identifier: &str) -> String {
    profile_identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

async fn write_file(path: &Path, contents: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, contents).await?;
    info!(path = %path.display(), bytes = contents.len(), "Wrote report artifact");
    Ok(())
}

pub async fn write_text_report(
    dir: &Path,
    profile_identifier: &str,
    text: &str,
) -> Result<PathBuf, CoreError> {
    let path = artifact_paths(dir, profile_identifier).text;
    write_file(&path, text).await?;
    Ok(path)
}

pub async fn write_structured_report(
    dir: &Path,
    profile_identifier: &str,
    json: &str,
) -> Result<PathBuf, CoreError> {
    let path = artifact_paths(dir, profile_identifier).structured;
    write_file(&path, json).await?;
    Ok(path)
}

/// Write both artifacts, creating `dir` if needed. Existing files are replaced.
pub async fn write_artifacts(
    dir: &Path,
    profile_identifier: &str,
    text: &str,
    json: &str,
) -> Result<ArtifactPaths, CoreError> {
    let text_path = write_text_report(dir, profile_identifier, text).await?;
    let structured_path = write_structured_report(dir, profile_identifier, json).await?;
    Ok(ArtifactPaths {
        text: text_path,
        structured: structured_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        let paths = artifact_paths(Path::new("output"), "kojied");
        assert_eq!(paths.text, Path::new("output/kojied_digital_profile.txt"));
        assert_eq!(
            paths.structured,
            Path::new("output/kojied_profile_data.json")
        );
    }

    #[test]
    fn test_unsafe_characters_replaced() {
        assert_eq!(file_stem("../evil name"), "___evil_name");
        assert_eq!(file_stem("Some-User_42"), "Some-User_42");
    }
}
