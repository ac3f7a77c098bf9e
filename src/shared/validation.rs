use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationErrors;

use super::types::FormErrors;

lazy_static! {
    /// Regex for category slugs
    /// Lowercase letters, digits, hyphens and underscores
    /// - Valid: "music", "live-shows", "2010_archive"
    /// - Invalid: "Music", "live shows", "", "café"
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9_-]+$").unwrap();

    /// Regex for author usernames
    /// - Valid: "alice", "bob.smith", "user-42", "j_doe@example"
    /// - Invalid: "", "has space", "semi;colon"
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[\w.@+-]+$").unwrap();
}

/// `http`/`https` URL with a host.
pub fn is_web_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Copy `validator` field errors into `form`, tagged with the formset row.
pub fn collect_field_errors(
    errors: &ValidationErrors,
    row: Option<usize>,
    id: Option<String>,
    form: &mut FormErrors,
) {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    for (field, field_errors) in fields {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({})", error.code));
            form.add(row, id.clone(), Some(field.as_ref()), message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "This field is required."))]
        name: String,
        #[validate(regex(path = *SLUG_REGEX, message = "Enter a valid slug."))]
        slug: String,
    }

    #[test]
    fn test_collect_field_errors_sorted_by_field() {
        let sample = Sample {
            name: String::new(),
            slug: "Not A Slug".to_string(),
        };
        let mut form = FormErrors::new();

        collect_field_errors(&sample.validate().unwrap_err(), Some(1), None, &mut form);

        assert_eq!(
            form.messages(),
            vec![
                "row 1: name: This field is required.".to_string(),
                "row 1: slug: Enter a valid slug.".to_string(),
            ]
        );
    }

    #[test]
    fn test_slug_regex_valid() {
        assert!(SLUG_REGEX.is_match("music"));
        assert!(SLUG_REGEX.is_match("live-shows"));
        assert!(SLUG_REGEX.is_match("2010_archive"));
    }

    #[test]
    fn test_slug_regex_invalid() {
        assert!(!SLUG_REGEX.is_match("Music")); // uppercase
        assert!(!SLUG_REGEX.is_match("live shows")); // space
        assert!(!SLUG_REGEX.is_match(""));
        assert!(!SLUG_REGEX.is_match("café"));
    }

    #[test]
    fn test_username_regex() {
        assert!(USERNAME_REGEX.is_match("bob.smith"));
        assert!(USERNAME_REGEX.is_match("j_doe@example"));
        assert!(!USERNAME_REGEX.is_match("has space"));
        assert!(!USERNAME_REGEX.is_match("semi;colon"));
    }

    #[test]
    fn test_is_web_url() {
        assert!(is_web_url("http://example.com/video.mp4"));
        assert!(is_web_url("https://example.com"));
        assert!(!is_web_url("ftp://example.com/file"));
        assert!(!is_web_url("javascript:alert(1)"));
        assert!(!is_web_url("not a url"));
    }
}
