//! TikTok URL and username helpers.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::FetchError;

static HANDLE_IN_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9._-]{2,32})").expect("valid regex"));

static VALID_USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{2,32}$").expect("valid regex"));

static VIDEO_OWNER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([^/?#]+)").expect("valid regex"));

/// Username used when a video URL does not name its owner.
pub const UNKNOWN_USERNAME: &str = "unknown";

/// Pull a username out of user input: `@user`, `user`, or a profile URL
/// such as `https://www.tiktok.com/@user?lang=fr`.
///
/// Returns `None` for blank input. The result is not validated; see
/// [`validate_username`].
#[must_use]
pub fn extract_username(input: &str) -> Option<String> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(caps) = HANDLE_IN_TEXT_RE.captures(s) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }

    let lowered = s.to_ascii_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    if let Some(rest) = without_www.strip_prefix("tiktok.com/") {
        // Preserve the caller's casing: slice the original at the same offset.
        let offset = s.len() - rest.len();
        let segment = s[offset..].split(['/', '?', '#']).next().unwrap_or_default();
        return Some(segment.trim_start_matches('@').to_string()).filter(|u| !u.is_empty());
    }

    Some(s.trim_start_matches('@').to_string()).filter(|u| !u.is_empty())
}

/// `true` when `username` is 2-32 characters of `[A-Za-z0-9._-]`.
#[must_use]
pub fn is_valid_username(username: &str) -> bool {
    VALID_USERNAME_RE.is_match(username)
}

/// Extract and validate a username in one step.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] when no valid username can be found.
pub fn validate_username(input: &str) -> Result<String, FetchError> {
    match extract_username(input) {
        Some(username) if is_valid_username(&username) => Ok(username),
        _ => Err(FetchError::InvalidUrl {
            url: input.to_owned(),
            reason: "expected a TikTok username like @creator (2-32 of A-Z a-z 0-9 . _ -)"
                .to_owned(),
        }),
    }
}

/// Owner handle from a video URL (`https://www.tiktok.com/@user/video/123`),
/// or [`UNKNOWN_USERNAME`].
#[must_use]
pub fn username_from_video_url(url: &str) -> String {
    VIDEO_OWNER_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map_or_else(|| UNKNOWN_USERNAME.to_string(), |m| m.as_str().to_string())
}

/// Profile page URL for `username` under `base_url` (no trailing slash).
#[must_use]
pub fn profile_url(base_url: &str, username: &str) -> String {
    format!("{}/@{username}", base_url.trim_end_matches('/'))
}

/// Check that `url` is an absolute http(s) URL with a host.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] otherwise.
pub fn validate_page_url(url: &str) -> Result<reqwest::Url, FetchError> {
    let parsed = reqwest::Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(FetchError::InvalidUrl {
            url: url.to_owned(),
            reason: "expected an http(s) URL".to_owned(),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_handle_and_plain_name() {
        assert_eq!(extract_username("@fredwav").as_deref(), Some("fredwav"));
        assert_eq!(extract_username("  fredwav ").as_deref(), Some("fredwav"));
    }

    #[test]
    fn extracts_from_profile_and_video_urls() {
        assert_eq!(
            extract_username("https://www.tiktok.com/@Chef.Lea?lang=fr").as_deref(),
            Some("Chef.Lea")
        );
        assert_eq!(
            extract_username("https://www.tiktok.com/@chef.lea/video/735").as_deref(),
            Some("chef.lea")
        );
    }

    #[test]
    fn extracts_from_url_without_at_sign() {
        assert_eq!(
            extract_username("tiktok.com/someone/").as_deref(),
            Some("someone")
        );
    }

    #[test]
    fn blank_input_is_none() {
        assert_eq!(extract_username("   "), None);
        assert_eq!(extract_username("@"), None);
    }

    #[test]
    fn validation_enforces_charset_and_length() {
        assert!(is_valid_username("ab"));
        assert!(is_valid_username("a.b_c-d"));
        assert!(!is_valid_username("a"));
        assert!(!is_valid_username(&"x".repeat(33)));
        assert!(!is_valid_username("has space"));
        assert!(validate_username("@ok_user").is_ok());
        assert!(matches!(
            validate_username("no way"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn video_owner_or_unknown() {
        assert_eq!(
            username_from_video_url("https://www.tiktok.com/@coach/video/1?is_from_webapp=1"),
            "coach"
        );
        assert_eq!(username_from_video_url("https://vm.tiktok.com/ZMabc/"), "unknown");
    }

    #[test]
    fn profile_url_joins_cleanly() {
        assert_eq!(
            profile_url("https://www.tiktok.com/", "coach"),
            "https://www.tiktok.com/@coach"
        );
    }

    #[test]
    fn page_url_must_be_http() {
        assert!(validate_page_url("https://www.tiktok.com/@a/video/1").is_ok());
        assert!(validate_page_url("ftp://example.com/x").is_err());
        assert!(validate_page_url("not a url").is_err());
    }
}
