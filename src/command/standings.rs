use crate::color::unwrap_resolved;
use cf_sync::Hub;
use std::io::Write;
use termcolor::StandardStream;

pub async fn standings(stdout: &mut StandardStream, hub: &Hub, contest_id: u64, handles: &[String], unofficial: bool) {
    let table = match unwrap_resolved(
        stdout,
        "standings",
        hub.standings.get(contest_id, handles, unofficial).await,
    ) {
        Some(v) => v,
        None => return,
    };
    write_info!(stdout, "Contest", "{}", table.contest.name);
    for row in &table.rows {
        let who = row
            .party
            .team_name
            .clone()
            .unwrap_or_else(|| {
                row.party
                    .members
                    .iter()
                    .map(|m| m.handle.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            });
        let solved = row.problem_results.iter().filter(|r| r.points > 0.0).count();
        write_ok!(
            stdout,
            row.rank,
            "{} {} pts, {} solved, penalty {}",
            who,
            row.points,
            solved,
            row.penalty
        );
    }
    for h in handles {
        if table.row_for(h).is_none() {
            write_info!(stdout, "Info", "{} did not take part", h);
        }
    }
}
