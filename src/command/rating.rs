use crate::color::unwrap_resolved;
use cf_sync::{model::RatingChange, Hub};
use std::io::Write;
use termcolor::StandardStream;

fn print_change(stdout: &mut StandardStream, label: &str, c: &RatingChange) {
    write_ok!(
        stdout,
        label,
        "{:>5} -> {:<5} ({:+}) rank {} in {}",
        c.old_rating,
        c.new_rating,
        c.delta(),
        c.rank,
        c.contest_name
    );
}

pub async fn user(stdout: &mut StandardStream, hub: &Hub, handle: &str) {
    if let Some(history) = unwrap_resolved(stdout, "rating history", hub.ratings.by_handle(handle).await) {
        if history.is_empty() {
            write_info!(stdout, "Info", "{} has no rated contest", handle);
        }
        for c in &history {
            print_change(stdout, &c.contest_id.to_string(), c);
        }
        if let Some(max) = history.iter().map(|c| c.new_rating).max() {
            write_info!(stdout, "Max", "{}", max);
        }
    }
}

pub async fn contest(stdout: &mut StandardStream, hub: &Hub, contest_id: u64) {
    if let Some(changes) = unwrap_resolved(stdout, "rating changes", hub.ratings.by_contest(contest_id).await) {
        if changes.is_empty() {
            write_info!(stdout, "Info", "No rating changes for contest {}", contest_id);
        }
        for c in &changes {
            print_change(stdout, &c.handle, c);
        }
    }
}
