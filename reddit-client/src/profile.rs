use persona_core::CoreError;
use url::Url;

const USER_PATH_PREFIXES: [&str; 3] = ["u", "user", "users"];
const MAX_USERNAME_LEN: usize = 32;

/// Extract the username from a profile URL (`https://www.reddit.com/user/x/`,
/// `/u/x`, `/users/x`), a `u/x` shorthand, or a bare username.
pub fn parse_profile_identifier(input: &str) -> Result<String, CoreError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CoreError::invalid_input("profile URL is empty"));
    }

    let username = if looks_like_url(input) {
        username_from_url(input)?
    } else {
        let path = input.trim_matches('/');
        let path = USER_PATH_PREFIXES
            .iter()
            .find_map(|prefix| {
                path.strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('/'))
            })
            .unwrap_or(path);
        path.to_string()
    };

    if is_valid_username(&username) {
        Ok(username)
    } else {
        Err(CoreError::invalid_input(format!(
            "Invalid Reddit URL format: {}",
            input
        )))
    }
}

fn looks_like_url(input: &str) -> bool {
    input.contains("://") || input.contains("reddit.com")
}

fn username_from_url(input: &str) -> Result<String, CoreError> {
    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };
    let invalid = || CoreError::invalid_input(format!("Invalid Reddit URL format: {}", input));

    let url = Url::parse(&with_scheme).map_err(|_| invalid())?;
    let host = url.host_str().unwrap_or_default();
    if host != "reddit.com" && !host.ends_with(".reddit.com") {
        return Err(invalid());
    }

    let mut segments = url.path_segments().ok_or_else(invalid)?;
    while let Some(segment) = segments.next() {
        if USER_PATH_PREFIXES.contains(&segment) {
            return segments
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(invalid);
        }
    }
    Err(invalid())
}

fn is_valid_username(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_USERNAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
