use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Before,
    Coding,
    PendingSystemTest,
    SystemTest,
    Finished,
    #[serde(other)]
    Unknown,
}
impl Phase {
    pub fn is_running(self) -> bool {
        matches!(self, Self::Coding | Self::PendingSystemTest | Self::SystemTest)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub phase: Phase,
    #[serde(default)]
    pub frozen: bool,
    pub duration_seconds: i64,
    pub start_time_seconds: Option<i64>,
    pub relative_time_seconds: Option<i64>,
}
impl Contest {
    pub fn end_time_seconds(&self) -> Option<i64> {
        self.start_time_seconds.map(|v| v + self.duration_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub contest_id: Option<u64>,
    pub problemset_name: Option<String>,
    pub index: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub points: Option<f64>,
    pub rating: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}
impl Problem {
    /// `1520B` style identifier.
    pub fn code(&self) -> String {
        match self.contest_id {
            Some(id) => format!("{}{}", id, self.index),
            None => self.index.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStatistics {
    pub contest_id: Option<u64>,
    pub index: String,
    pub solved_count: u64,
}

/// Result of `problemset.problems`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSet {
    pub problems: Vec<Problem>,
    pub problem_statistics: Vec<ProblemStatistics>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RatingChange {
    pub contest_id: u64,
    pub contest_name: String,
    pub handle: String,
    pub rank: u64,
    pub rating_update_time_seconds: i64,
    pub old_rating: i32,
    pub new_rating: i32,
}
impl RatingChange {
    pub fn delta(&self) -> i32 {
        self.new_rating - self.old_rating
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub handle: String,
    pub rating: Option<i32>,
    pub max_rating: Option<i32>,
    pub rank: Option<String>,
    pub max_rank: Option<String>,
    pub country: Option<String>,
    pub organization: Option<String>,
    pub registration_time_seconds: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub handle: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub contest_id: Option<u64>,
    pub members: Vec<Member>,
    pub participant_type: String,
    pub team_name: Option<String>,
    #[serde(default)]
    pub ghost: bool,
    pub room: Option<u32>,
    pub start_time_seconds: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResult {
    pub points: f64,
    pub penalty: Option<i64>,
    pub rejected_attempt_count: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub best_submission_time_seconds: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RanklistRow {
    pub party: Party,
    pub rank: u64,
    pub points: f64,
    pub penalty: i64,
    pub successful_hack_count: u32,
    pub unsuccessful_hack_count: u32,
    pub problem_results: Vec<ProblemResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Standings {
    pub contest: Contest,
    pub problems: Vec<Problem>,
    pub rows: Vec<RanklistRow>,
}
impl Standings {
    /// The row in which `handle` (any case) is a member.
    pub fn row_for(&self, handle: &str) -> Option<&RanklistRow> {
        self.rows.iter().find(|row| {
            row.party
                .members
                .iter()
                .any(|m| m.handle.eq_ignore_ascii_case(handle))
        })
    }
}
