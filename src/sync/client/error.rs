use crate::error::BoxedError;
use std::{error::Error as StdError, fmt, time::Duration};

#[derive(Debug)]
pub enum Kind {
    Network(BoxedError),
    Timeout(Duration),
    HttpStatus {
        status: u16,
        retryable: bool,
        comment: Option<String>,
    },
    Upstream(String),
    Decode(serde_json::Error),
    Url(url::ParseError),
}

#[derive(Debug)]
pub struct Error {
    endpoint: String,
    kind: Kind,
}

impl Error {
    pub(crate) fn new<S: Into<String>>(endpoint: S, kind: Kind) -> Self {
        Self {
            endpoint: endpoint.into(),
            kind,
        }
    }
    pub(super) fn from_status(endpoint: &str, status: u16, comment: Option<String>) -> Self {
        Self::new(
            endpoint,
            Kind::HttpStatus {
                status,
                retryable: is_retryable_status(status),
                comment,
            },
        )
    }
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
    pub fn kind(&self) -> &Kind {
        &self.kind
    }
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            Kind::HttpStatus { status, .. } => Some(status),
            _ => None,
        }
    }
    /// Only client errors other than 429 (and unusable URLs) are final.
    /// Anything else, unexpected failures included, is worth another try.
    pub fn retryable(&self) -> bool {
        match self.kind {
            Kind::HttpStatus { retryable, .. } => retryable,
            Kind::Url(_) => false,
            Kind::Network(_) | Kind::Timeout(_) | Kind::Upstream(_) | Kind::Decode(_) => true,
        }
    }
    /// Short description without the endpoint, as reported upstream when possible.
    pub fn message(&self) -> String {
        match &self.kind {
            Kind::Upstream(comment) => comment.clone(),
            Kind::HttpStatus {
                comment: Some(comment),
                ..
            } => comment.clone(),
            Kind::HttpStatus { status, .. } => format!("HTTP status {}", status),
            Kind::Network(e) => e.to_string(),
            Kind::Timeout(t) => format!("timed out after {}s", t.as_secs_f32()),
            Kind::Decode(e) => format!("malformed response: {}", e),
            Kind::Url(e) => format!("invalid url: {}", e),
        }
    }
}

pub(crate) fn is_retryable_status(status: u16) -> bool {
    !(400..500).contains(&status) || status == 429
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Network(_) => write!(f, "Error sending request to {}", self.endpoint)?,
            Kind::Timeout(_) => write!(f, "Request to {} timed out", self.endpoint)?,
            Kind::HttpStatus { .. } => write!(f, "Request to {} rejected", self.endpoint)?,
            Kind::Upstream(_) => write!(f, "API request {} failed", self.endpoint)?,
            Kind::Decode(_) => write!(f, "Error decoding response of {}", self.endpoint)?,
            Kind::Url(_) => write!(f, "Error building url for {}", self.endpoint)?,
        }
        write!(f, ": {}", self.message())
    }
}
impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            Kind::Network(e) => Some(e.as_ref()),
            Kind::Decode(e) => Some(e),
            Kind::Url(e) => Some(e),
            Kind::Timeout(_) | Kind::HttpStatus { .. } | Kind::Upstream(_) => None,
        }
    }
}
