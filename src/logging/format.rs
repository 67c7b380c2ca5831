//! Line format: `[<RFC3339 time>] <LEVEL>: <message> (<k: v, ...>)`.
//!
//! Levels print as `TRACE`, `DEBUG`, `INFO`, `WARNING` and `ERROR`.
//!
//! The parenthesised part is omitted when the event carries no fields other
//! than its message.

use std::fmt;

use chrono::{Local, SecondsFormat};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Event formatter producing one plain-text line per record.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let now = Local::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let level = level_label(event.metadata().level());
        write!(writer, "[{now}] {level}: {}", fields.message)?;
        if !fields.pairs.is_empty() {
            write!(writer, " ({})", fields.pairs.join(", "))?;
        }
        writeln!(writer)
    }
}

fn level_label(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    pairs: Vec<String>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.pairs.push(format!("{}: {}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.pairs.push(format!("{}: {:?}", field.name(), value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warn_prints_as_warning() {
        assert_eq!(level_label(&Level::WARN), "WARNING");
        assert_eq!(level_label(&Level::ERROR), "ERROR");
        assert_eq!(level_label(&Level::TRACE), "TRACE");
    }
}
