use crate::color::unwrap_resolved;
use cf_sync::{contests::Scope, model::Contest, Hub};
use chrono::{Local, TimeZone};
use std::io::Write;
use termcolor::StandardStream;

pub enum Query {
    Upcoming,
    Ongoing,
    Finished,
    Latest,
    Search(String),
    Id(u64),
}

pub fn parse_scope(s: &str) -> Option<Scope> {
    match s {
        "official" => Some(Scope::Official),
        "gym" => Some(Scope::Gym),
        "all" => Some(Scope::All),
        _ => None,
    }
}

fn print_contest(stdout: &mut StandardStream, c: &Contest) {
    let start = c
        .start_time_seconds
        .and_then(|v| Local.timestamp_opt(v, 0).single())
        .map(|v| v.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    write_ok!(
        stdout,
        c.id,
        "{} [{}] starts {} lasts {}min",
        c.name,
        c.kind,
        start,
        c.duration_seconds / 60
    );
}

pub async fn contests(stdout: &mut StandardStream, hub: &Hub, scope: Scope, query: Query) {
    let found = match query {
        Query::Upcoming => hub.contests.upcoming(scope).await,
        Query::Ongoing => hub.contests.ongoing(scope).await,
        Query::Finished => hub.contests.finished(scope).await,
        Query::Search(text) => hub.contests.search(scope, &text).await,
        Query::Latest => hub
            .contests
            .latest_finished(scope)
            .await
            .map(|r| r.map(|v| v.into_iter().collect())),
        Query::Id(id) => hub
            .contests
            .by_id(id)
            .await
            .map(|r| r.map(|v| v.into_iter().collect())),
    };
    if let Some(list) = unwrap_resolved(stdout, "contest list", found) {
        if list.is_empty() {
            write_info!(stdout, "Info", "No matching contest");
        }
        for c in &list {
            print_contest(stdout, c);
        }
    }
}
