//! stderr logger. Lines look like `[WARN] bone 3 has parent 9`, with the
//! module path added at debug and trace levels.

use log::{Level, Log, Metadata, Record};
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

struct StderrLogger {
    max_level: Level,
    color: ColorChoice,
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug | Level::Trace => Color::Cyan,
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = record.level();
        let mut out = StandardStream::stderr(self.color);
        let _ = out.set_color(ColorSpec::new().set_fg(Some(level_color(level))).set_bold(level <= Level::Warn));
        let _ = write!(out, "[{}]", level);
        let _ = out.reset();
        if level >= Level::Debug {
            let _ = write!(out, " {}:", record.target());
        }
        let _ = writeln!(out, " {}", record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Level for the number of `-v` flags given.
pub fn level_for_verbosity(count: u64) -> Level {
    match count {
        0 => Level::Info,
        1 => Level::Debug,
        _ => Level::Trace,
    }
}

pub fn init(max_level: Level) {
    let color = if atty::is(atty::Stream::Stderr) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let logger = StderrLogger { max_level, color };
    let _ = log::set_boxed_logger(Box::new(logger));
    log::set_max_level(max_level.to_level_filter());
}

#[test]
fn test_verbosity_levels() {
    assert_eq!(level_for_verbosity(0), Level::Info);
    assert_eq!(level_for_verbosity(1), Level::Debug);
    assert_eq!(level_for_verbosity(7), Level::Trace);
}
