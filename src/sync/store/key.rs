use super::StoreError;
use rusqlite::types::Value;
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContestScope {
    Official,
    Gym,
}
impl ContestScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Official => "official",
            Self::Gym => "gym",
        }
    }
}

/// Canonical identity of a standings request: contest plus a digest of the
/// handle set that does not depend on order, case or duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StandingsKey {
    pub contest_id: u64,
    pub handles_hash: String,
}
impl StandingsKey {
    pub fn new<S: AsRef<str>>(contest_id: u64, handles: &[S], unofficial: bool) -> Self {
        let mut canonical = canonical_handles(handles).join(";");
        if unofficial {
            canonical.push_str("#unofficial");
        }
        Self {
            contest_id,
            handles_hash: format!("{:x}", Sha256::digest(canonical.as_bytes())),
        }
    }
}

pub fn normalize_handle(handle: &str) -> String {
    handle.trim().to_lowercase()
}

/// Trimmed, lower-cased, sorted and deduplicated.
pub fn canonical_handles<S: AsRef<str>>(handles: &[S]) -> Vec<String> {
    let mut ret: Vec<String> = handles
        .iter()
        .map(|v| normalize_handle(v.as_ref()))
        .filter(|v| !v.is_empty())
        .collect();
    ret.sort_unstable();
    ret.dedup();
    ret
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    ContestList(ContestScope),
    UserRating(String),
    ContestRating(u64),
    Standings(StandingsKey),
    ProblemCatalog,
}

pub(super) struct Table {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

const PROBLEM_CATALOG: &str = "problemset";

impl CacheKey {
    pub fn user_rating(handle: &str) -> Self {
        Self::UserRating(normalize_handle(handle))
    }
    pub(super) fn table(&self) -> Table {
        match self {
            Self::ContestList(_) => Table {
                name: "contest_list_cache",
                columns: &["scope"],
            },
            Self::UserRating(_) => Table {
                name: "user_rating_cache",
                columns: &["handle"],
            },
            Self::ContestRating(_) => Table {
                name: "contest_rating_cache",
                columns: &["contest_id"],
            },
            Self::Standings(_) => Table {
                name: "standings_cache",
                columns: &["contest_id", "handles_hash"],
            },
            Self::ProblemCatalog => Table {
                name: "problem_cache",
                columns: &["name"],
            },
        }
    }
    /// Column values in `table().columns` order. Contest ids that don't fit
    /// an SQLite integer are refused rather than wrapped.
    pub(super) fn values(&self) -> Result<Vec<Value>, StoreError> {
        Ok(match self {
            Self::ContestList(scope) => vec![Value::Text(scope.as_str().to_string())],
            Self::UserRating(handle) => vec![Value::Text(handle.clone())],
            Self::ContestRating(id) => vec![contest_id(*id)?],
            Self::Standings(key) => vec![
                contest_id(key.contest_id)?,
                Value::Text(key.handles_hash.clone()),
            ],
            Self::ProblemCatalog => vec![Value::Text(PROBLEM_CATALOG.to_string())],
        })
    }
}
fn contest_id(id: u64) -> Result<Value, StoreError> {
    i64::try_from(id)
        .map(Value::Integer)
        .map_err(|_| StoreError::KeyRange(id))
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContestList(scope) => write!(f, "contest list ({})", scope.as_str()),
            Self::UserRating(handle) => write!(f, "rating history of {}", handle),
            Self::ContestRating(id) => write!(f, "rating changes of contest {}", id),
            Self::Standings(key) => write!(
                f,
                "standings of contest {} [{}]",
                key.contest_id,
                &key.handles_hash[..8.min(key.handles_hash.len())]
            ),
            Self::ProblemCatalog => write!(f, "problem catalog"),
        }
    }
}
