//! Tracing layer that flattens each event into one line for a sink.
//!
//! # Design
//! - The sink decides where lines go; the browser shell hands them to the console.
//! - Spans are ignored. Events render as `target: message key=value ...`.

use std::fmt::{self, Write as _};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Layer forwarding events at or above `max_level` to a line sink.
pub struct LineLayer<F> {
    max_level: Level,
    sink: F,
}

impl<F> LineLayer<F>
where
    F: Fn(Level, &str) + Send + Sync + 'static,
{
    /// Forward events no more verbose than `max_level` to `sink`.
    pub const fn new(max_level: Level, sink: F) -> Self {
        Self { max_level, sink }
    }
}

impl<F> fmt::Debug for LineLayer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineLayer")
            .field("max_level", &self.max_level)
            .finish_non_exhaustive()
    }
}

impl<S, F> Layer<S> for LineLayer<F>
where
    S: Subscriber,
    F: Fn(Level, &str) + Send + Sync + 'static,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        *metadata.level() <= self.max_level
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut line = LineVisitor::default();
        event.record(&mut line);
        (self.sink)(*metadata.level(), &line.finish(metadata.target()));
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(self, target: &str) -> String {
        format!("{target}: {}{}", self.message, self.fields)
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::prelude::*;

    #[test]
    fn events_become_single_lines() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let subscriber = tracing_subscriber::registry().with(LineLayer::new(
            Level::INFO,
            move |level: Level, line: &str| sink.lock().unwrap().push((level, line.to_string())),
        ));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "folio", id = %"srv-1", status = 500, "delete rolled back");
            tracing::debug!(target: "folio", "too chatty");
            tracing::info!(target: "folio", file = "a.pdf", "upload confirmed");
        });

        assert_eq!(
            *lines.lock().unwrap(),
            vec![
                (Level::WARN, "folio: delete rolled back id=srv-1 status=500".to_string()),
                (Level::INFO, "folio: upload confirmed file=a.pdf".to_string()),
            ]
        );
    }
}
