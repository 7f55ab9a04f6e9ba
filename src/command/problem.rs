use crate::color::unwrap_resolved;
use cf_sync::{problems::ProblemFilter, Hub};
use std::io::Write;
use termcolor::StandardStream;

pub async fn problems(stdout: &mut StandardStream, hub: &Hub, filter: &ProblemFilter, limit: usize) {
    if let Some(list) = unwrap_resolved(stdout, "problem catalog", hub.problems.filter(filter).await) {
        write_info!(stdout, "Info", "{} problem(s) matched", list.len());
        for p in list.iter().take(limit) {
            write_ok!(
                stdout,
                p.code(),
                "{} ({}) {}",
                p.name,
                p.rating.map_or_else(|| "unrated".to_string(), |r| r.to_string()),
                p.tags.join(", ")
            );
        }
    }
}

pub async fn tags(stdout: &mut StandardStream, hub: &Hub) {
    if let Some(tags) = unwrap_resolved(stdout, "problem tags", hub.problems.tags().await) {
        write_ok!(stdout, "Tags", "{}", tags.join(", "));
    }
}
