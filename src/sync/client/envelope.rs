use serde::{de::IgnoredAny, Deserialize};

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub(super) enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "FAILED")]
    Failed,
}

/// `{status, result, comment}` wrapper around every API response.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    pub status: Status,
    pub result: Option<T>,
    pub comment: Option<String>,
}

/// Best-effort extraction of `comment` from a body that may not be an envelope.
pub(super) fn comment_of(body: &str) -> Option<String> {
    serde_json::from_str::<Envelope<IgnoredAny>>(body)
        .ok()
        .and_then(|v| v.comment)
}
