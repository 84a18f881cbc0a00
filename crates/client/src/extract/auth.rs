//! Authentication wall detection.

use regex::Regex;
use scraper::{Html, Selector};
use specscout_core::Error;
use std::sync::LazyLock;

static INPUTS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("input[type]").expect("invalid selector"));
static FORMS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("form[action]").expect("invalid selector"));
static HEADINGS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title, h1").expect("invalid selector"));

const LOGIN_ACTIONS: &[&str] = &["login", "signin", "sign-in", "sign_in", "auth", "sso"];

/// Whole-word sign-in phrases. A bare "login" only counts when it leads
/// the heading on its own, so "Login API reference" stays public.
static SIGN_IN_WORDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(sign[ -]in|log[ -]in|login required|authentication required|please authenticate)\b|^\s*login\s*($|[|:\-])",
    )
    .expect("invalid sign-in pattern")
});

/// Why a page looks like a login wall, if it does.
pub fn auth_wall_reason(html: &str) -> Option<&'static str> {
    let document = Html::parse_document(html);

    let password = document
        .select(&INPUTS)
        .any(|input| input.value().attr("type").is_some_and(|t| t.eq_ignore_ascii_case("password")));
    if password {
        return Some("password input");
    }

    let login_form = document.select(&FORMS).any(|form| {
        form.value()
            .attr("action")
            .map(str::to_ascii_lowercase)
            .is_some_and(|action| LOGIN_ACTIONS.iter().any(|kw| action.contains(kw)))
    });
    if login_form {
        return Some("login form");
    }

    let wording = document.select(&HEADINGS).any(|el| {
        let text = el.text().collect::<String>();
        SIGN_IN_WORDING.is_match(text.trim())
    });
    if wording {
        return Some("sign-in wording");
    }

    None
}

/// Fail with `AuthenticationRequired` when the page is a login wall.
pub fn ensure_public(html: &str, url: &str) -> Result<(), Error> {
    match auth_wall_reason(html) {
        Some(reason) => {
            tracing::info!("authentication wall at {} ({})", url, reason);
            Err(Error::AuthenticationRequired(format!("{url} requires sign-in ({reason})")))
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_input() {
        let html = r#"<form><input type="email"><input type="PASSWORD"></form>"#;
        assert_eq!(auth_wall_reason(html), Some("password input"));
    }

    #[test]
    fn test_login_form_action() {
        let html = r#"<form action="https://id.example.com/oauth/SignIn?next=/docs"><button>Go</button></form>"#;
        assert_eq!(auth_wall_reason(html), Some("login form"));
    }

    #[test]
    fn test_sign_in_wording() {
        assert_eq!(auth_wall_reason("<title>Log in | Acme</title>"), Some("sign-in wording"));
        assert_eq!(auth_wall_reason("<h1>Authentication required</h1>"), Some("sign-in wording"));
        assert_eq!(auth_wall_reason("<title>Login | Acme</title>"), Some("sign-in wording"));
        assert_eq!(auth_wall_reason("<h1>Login required</h1>"), Some("sign-in wording"));
    }

    #[test]
    fn test_login_as_topic_is_public() {
        assert_eq!(auth_wall_reason("<title>Login API reference</title>"), None);
        assert_eq!(auth_wall_reason("<h1>POST /v1/login</h1>"), None);
        assert_eq!(auth_wall_reason("<h1>Blog index</h1>"), None);
        assert_eq!(auth_wall_reason("<h1>Designing a plugin system</h1>"), None);
    }

    #[test]
    fn test_public_docs_pass() {
        let html = r#"<title>Acme API Reference</title><h1>Pets</h1><form action="/search"><input name="q"></form>"#;
        assert_eq!(auth_wall_reason(html), None);
        assert!(ensure_public(html, "https://docs.acme.io").is_ok());
    }

    #[test]
    fn test_ensure_public_error() {
        let err = ensure_public("<h1>Please sign in</h1>", "https://docs.acme.io").unwrap_err();
        assert!(matches!(err, Error::AuthenticationRequired(_)));
    }
}
