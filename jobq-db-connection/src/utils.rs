use std::borrow::Cow;

const REDACTED: &str = "****";

/// Database URL safe to put in a log line.
///
/// Only the password is masked; the user name stays so a misconfigured
/// `DB_USER` remains visible. SQLite DSNs carry no credentials and are
/// returned untouched, and anything that does not parse is hidden entirely.
pub fn sanitize_database_url(raw: &str) -> Cow<'_, str> {
    if raw.starts_with("sqlite:") {
        return Cow::Borrowed(raw);
    }
    if !raw.contains("://") {
        return Cow::Borrowed("<redacted>");
    }
    let Ok(mut url) = url::Url::parse(raw) else {
        return Cow::Borrowed("<redacted>");
    };
    if url.password().is_none() {
        return Cow::Borrowed(raw);
    }
    if url.set_password(Some(REDACTED)).is_err() {
        return Cow::Borrowed("<redacted>");
    }
    Cow::Owned(url.to_string())
}
