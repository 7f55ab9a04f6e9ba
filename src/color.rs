use cf_sync::{Resolved, Source};
use std::io::Write;
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

macro_rules! get_version {
    ($file:expr) => {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " ",
            include_str!(concat!(env!("OUT_DIR"), "/", $file))
        )
    };
}

pub fn set_fg(stdout: &mut StandardStream, color: Color) {
    stdout
        .set_color(ColorSpec::new().set_fg(Some(color)).set_intense(true))
        .expect("Error: can't set output color");
}
pub fn reset_fg(stdout: &mut StandardStream) {
    stdout
        .set_color(ColorSpec::new().set_fg(None).set_intense(true))
        .expect("Error: Can't reset color");
}

macro_rules! write_color {
    ($dest:expr, $color:expr,$typ:expr,  $($arg:tt)*) => { {
        $crate::color::set_fg($dest, $color);
        write!($dest,"{:>7}: ", $typ).expect("Failed to write output");
        $crate::color::reset_fg($dest);
        writeln!($dest, $($arg)*).expect("Failed to write output");
    }
    };
}

macro_rules! write_error {
    ($dest:expr,$typ:expr, $($arg:tt)*) => {
        write_color!($dest, termcolor::Color::Red, $typ, $($arg)*)
    };
}

macro_rules! write_warn {
    ($dest:expr,$typ:expr, $($arg:tt)*) => {
        write_color!($dest, termcolor::Color::Yellow, $typ, $($arg)*)
    };
}

macro_rules! write_info {
    ($dest:expr,$typ:expr, $($arg:tt)*) => {
        write_color!($dest, termcolor::Color::Blue, $typ, $($arg)*)
    };
}

macro_rules! write_ok {
    ($dest:expr,$typ:expr, $($arg:tt)*) => {
        write_color!($dest, termcolor::Color::Green, $typ, $($arg)*)
    };
}

/// Prints the unavailable notice for `None`, a disclaimer for stale data, and
/// hands the data back when there is some.
pub fn unwrap_resolved<T>(stdout: &mut StandardStream, what: &str, resolved: Option<Resolved<T>>) -> Option<T> {
    match resolved {
        None => {
            write_error!(
                stdout,
                "Error",
                "{} is unavailable right now, try again later",
                what
            );
            None
        }
        Some(r) => {
            if r.stale {
                write_warn!(
                    stdout,
                    "Stale",
                    "codeforces is not answering, showing cached {} that may be out of date",
                    what
                );
            } else if r.source == Source::Cache {
                write_info!(stdout, "Cache", "{} served from cache", what);
            }
            Some(r.data)
        }
    }
}
