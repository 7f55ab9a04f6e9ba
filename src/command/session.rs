use cf_sync::{Hub, Settings};
use std::io::Write;
use termcolor::StandardStream;

pub async fn open(stdout: &mut StandardStream, settings: &Settings) -> Option<Hub> {
    match Hub::open(settings).await {
        Ok(hub) => {
            write_info!(
                stdout,
                "Info",
                "{} egress slot(s): {}",
                hub.api.pool().size(),
                hub.api.pool().labels().collect::<Vec<_>>().join(", ")
            );
            for p in hub.api.pool().proxies() {
                match &p.credentials {
                    Some(c) => write_info!(stdout, "Proxy", "{} as {}", p, c.user),
                    None => write_info!(stdout, "Proxy", "{}", p),
                }
            }
            Some(hub)
        }
        Err(e) => {
            write_error!(stdout, "Error", "{}", e);
            None
        }
    }
}

/// Startup connectivity check plus a profile lookup when handles are given.
pub async fn check(stdout: &mut StandardStream, hub: &Hub, handles: &[String]) -> bool {
    write_info!(stdout, "Info", "Checking codeforces.com API...");
    if let Err(e) = hub.api.check_connectivity().await {
        write_error!(stdout, "Fail", "{}", e);
        return false;
    }
    write_ok!(stdout, "Ok", "API reachable");
    if !handles.is_empty() {
        match hub.api.user_info(handles).await {
            Ok(users) => {
                for u in users {
                    write_ok!(
                        stdout,
                        "User",
                        "{} {} ({})",
                        u.handle,
                        u.rating.map_or_else(|| "unrated".to_string(), |r| r.to_string()),
                        u.rank.unwrap_or_default()
                    );
                }
            }
            Err(e) => write_error!(stdout, "Fail", "{}", e),
        }
    }
    let health = hub.api.health();
    if let Some(at) = health.last_success {
        write_info!(stdout, "Health", "last success at {}", at.to_rfc3339());
    }
    if let Some(e) = health.last_error {
        write_warn!(stdout, "Health", "last error on {}: {} at {}", e.endpoint, e.message, e.at.to_rfc3339());
    }
    true
}
