use cf_sync::{problems::ProblemFilter, Settings};
use clap::{crate_description, crate_name, Arg, ArgMatches, Command};
use pretty_env_logger::init_timed;
use std::{io::Write, process::exit};
use termcolor::{ColorChoice, StandardStream, WriteColor};

#[macro_use]
mod color;
mod command {
    pub mod contest;
    pub mod problem;
    pub mod rating;
    pub mod session;
    pub mod standings;
}

use command::{
    contest::{contests, parse_scope, Query},
    problem::{problems, tags},
    rating, session,
    standings::standings,
};

fn cli() -> Command<'static> {
    Command::new(crate_name!())
        .about(crate_description!())
        .version(get_version!("version"))
        .long_version(get_version!("long_version"))
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .takes_value(true)
                .help("Path to settings file (yaml)"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("check")
                .about("Check that the API is reachable")
                .arg(Arg::new("handle").multiple_values(true)),
        )
        .subcommand(
            Command::new("contests")
                .about("List contests")
                .arg(
                    Arg::new("scope")
                        .long("scope")
                        .takes_value(true)
                        .possible_values(["official", "gym", "all"])
                        .default_value("official"),
                )
                .arg(
                    Arg::new("query")
                        .possible_values(["upcoming", "ongoing", "finished", "latest", "search", "id"])
                        .default_value("upcoming"),
                )
                .arg(Arg::new("value").help("Search text or contest id")),
        )
        .subcommand(
            Command::new("rating")
                .about("Rating history of a handle")
                .arg(Arg::new("handle").required(true)),
        )
        .subcommand(
            Command::new("contest-rating")
                .about("Rating changes of a contest")
                .arg(Arg::new("contest").required(true)),
        )
        .subcommand(
            Command::new("standings")
                .about("Contest standings for some handles")
                .arg(Arg::new("contest").required(true))
                .arg(Arg::new("handle").required(true).multiple_values(true))
                .arg(Arg::new("unofficial").long("unofficial")),
        )
        .subcommand(
            Command::new("problems")
                .about("Search the problem catalog")
                .arg(
                    Arg::new("tag")
                        .long("tag")
                        .takes_value(true)
                        .multiple_occurrences(true),
                )
                .arg(Arg::new("min").long("min").takes_value(true))
                .arg(Arg::new("max").long("max").takes_value(true))
                .arg(Arg::new("contest").long("contest").takes_value(true))
                .arg(Arg::new("name").long("name").takes_value(true))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .takes_value(true)
                        .default_value("20"),
                )
                .arg(Arg::new("list-tags").long("list-tags")),
        )
}

fn values(m: &ArgMatches, name: &str) -> Vec<String> {
    m.values_of(name)
        .map(|v| v.map(str::to_string).collect())
        .unwrap_or_default()
}
fn number<T: std::str::FromStr>(stdout: &mut StandardStream, m: &ArgMatches, name: &str) -> Option<Option<T>> {
    match m.value_of(name) {
        None => Some(None),
        Some(v) => match v.parse() {
            Ok(v) => Some(Some(v)),
            Err(_) => {
                write_error!(stdout, "Error", r#"{} expects a number, got "{}""#, name, v);
                None
            }
        },
    }
}

fn load_settings(stdout: &mut StandardStream, app: &ArgMatches) -> Settings {
    match app.value_of("config") {
        None => Settings::default().with_env(),
        Some(path) => match Settings::load(path) {
            Ok(v) => v,
            Err(e) => {
                write_error!(stdout, "Error", "{}", e);
                exit(2)
            }
        },
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_timed();
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let app = cli().get_matches();
    let settings = load_settings(&mut stdout, &app);
    let hub = match session::open(&mut stdout, &settings).await {
        Some(v) => v,
        None => exit(1),
    };
    let ok = match app.subcommand() {
        Some(("check", m)) => session::check(&mut stdout, &hub, &values(m, "handle")).await,
        Some(("contests", m)) => {
            let scope = m
                .value_of("scope")
                .and_then(parse_scope)
                .unwrap_or(cf_sync::contests::Scope::Official);
            let value = m.value_of("value").unwrap_or_default().to_string();
            let query = match m.value_of("query").unwrap_or("upcoming") {
                "ongoing" => Some(Query::Ongoing),
                "finished" => Some(Query::Finished),
                "latest" => Some(Query::Latest),
                "search" => Some(Query::Search(value)),
                "id" => match number(&mut stdout, m, "value") {
                    Some(Some(id)) => Some(Query::Id(id)),
                    Some(None) => {
                        write_error!(&mut stdout, "Error", "contests id needs a contest id");
                        None
                    }
                    None => None,
                },
                _ => Some(Query::Upcoming),
            };
            match query {
                Some(q) => {
                    contests(&mut stdout, &hub, scope, q).await;
                    true
                }
                None => false,
            }
        }
        Some(("rating", m)) => {
            rating::user(&mut stdout, &hub, m.value_of("handle").unwrap_or_default()).await;
            true
        }
        Some(("contest-rating", m)) => match number(&mut stdout, m, "contest").flatten() {
            Some(id) => {
                rating::contest(&mut stdout, &hub, id).await;
                true
            }
            None => false,
        },
        Some(("standings", m)) => match number(&mut stdout, m, "contest").flatten() {
            Some(id) => {
                standings(&mut stdout, &hub, id, &values(m, "handle"), m.is_present("unofficial")).await;
                true
            }
            None => false,
        },
        Some(("problems", m)) => {
            if m.is_present("list-tags") {
                tags(&mut stdout, &hub).await;
                true
            } else {
                let parsed = (|| {
                    Some((
                        ProblemFilter {
                            tags: values(m, "tag"),
                            min_rating: number(&mut stdout, m, "min")?,
                            max_rating: number(&mut stdout, m, "max")?,
                            contest_id: number(&mut stdout, m, "contest")?,
                            name: m.value_of("name").map(str::to_string),
                        },
                        number::<usize>(&mut stdout, m, "limit")?.unwrap_or(20),
                    ))
                })();
                match parsed {
                    Some((filter, limit)) => {
                        problems(&mut stdout, &hub, &filter, limit).await;
                        true
                    }
                    None => false,
                }
            }
        }
        _ => false,
    };
    stdout.reset().ok();
    stdout.flush().ok();
    if !ok {
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
        let m = cli()
            .try_get_matches_from(["cf-sync", "standings", "1950", "tourist", "petr", "--unofficial"])
            .unwrap();
        let (name, sub) = m.subcommand().unwrap();
        assert_eq!(name, "standings");
        assert_eq!(values(sub, "handle"), vec!["tourist", "petr"]);
        assert!(sub.is_present("unofficial"));
    }

    #[test]
    fn output_macros_work_as_match_arms() {
        let mut out = StandardStream::stdout(ColorChoice::Never);
        for v in [Ok(1), Err("boom")] {
            match v {
                Ok(n) => write_ok!(&mut out, "Ok", "{}", n),
                Err(e) => write_error!(&mut out, "Error", "{}", e),
            }
        }
    }
}
