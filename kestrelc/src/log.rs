//! Terminal output for the driver.

use ansi_term::Colour;
use std::{env, io};
use tracing::{Level, Metadata};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::MakeWriter,
};

const LOG_FILTER: &str = "RUST_LOG";

pub fn println_red_err(txt: &str) {
    tracing::error!("{}", Colour::Red.paint(txt));
}

pub fn println_yellow_err(txt: &str) {
    tracing::warn!("{}", Colour::Yellow.paint(txt));
}

pub fn println_green_err(txt: &str) {
    tracing::error!("{}", Colour::Green.paint(txt));
}

// ERROR and WARN go to stderr, everything else to stdout.
struct StdioTracingWriter;

impl<'a> MakeWriter<'a> for StdioTracingWriter {
    type Writer = Box<dyn io::Write>;

    fn make_writer(&'a self) -> Self::Writer {
        Box::new(io::stdout())
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        if meta.level() <= &Level::WARN {
            return Box::new(io::stderr());
        }
        Box::new(io::stdout())
    }
}

#[derive(Debug, Default)]
pub struct TracingSubscriberOptions {
    pub verbosity: u8,
    pub silent: bool,
}

impl TracingSubscriberOptions {
    /// `-v` shows debug output and `-vv` traces; `--silent` wins over both.
    fn level_filter(&self) -> Option<LevelFilter> {
        if self.silent {
            return Some(LevelFilter::OFF);
        }
        match self.verbosity {
            0 => None,
            1 => Some(LevelFilter::DEBUG),
            _ => Some(LevelFilter::TRACE),
        }
    }
}

/// Installs a subscriber that prints bare messages, so logging reads like
/// ordinary console output.
///
/// `RUST_LOG` sets the minimum level, `info` by default. Verbosity flags and
/// `--silent` override it.
pub fn init_tracing_subscriber(options: TracingSubscriberOptions) -> anyhow::Result<()> {
    let env_filter = match env::var_os(LOG_FILTER) {
        Some(_) => EnvFilter::try_from_default_env()
            .map_err(|err| anyhow::anyhow!("invalid `{LOG_FILTER}` provided: {err}"))?,
        None => EnvFilter::new("info"),
    };

    let builder = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_level(false)
        .with_file(false)
        .with_line_number(false)
        .without_time()
        .with_target(false)
        .with_writer(StdioTracingWriter);

    if let Some(level_filter) = options.level_filter() {
        builder.with_max_level(level_filter).init();
    } else {
        builder.init();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_overrides_verbosity() {
        let options = TracingSubscriberOptions {
            verbosity: 2,
            silent: true,
        };
        assert_eq!(options.level_filter(), Some(LevelFilter::OFF));
    }

    #[test]
    fn verbosity_levels() {
        let level = |verbosity| {
            TracingSubscriberOptions {
                verbosity,
                silent: false,
            }
            .level_filter()
        };
        assert_eq!(level(0), None);
        assert_eq!(level(1), Some(LevelFilter::DEBUG));
        assert_eq!(level(2), Some(LevelFilter::TRACE));
    }
}
