//! Routes `tracing` events to the browser console.

use crate::core::logging::LineLayer;
use gloo::console;
use tracing::Level;
use tracing_subscriber::prelude::*;

/// Install the console subscriber. A second call is logged and ignored.
pub(crate) fn install() {
    let max_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = tracing_subscriber::registry().with(LineLayer::new(max_level, forward));
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        console::warn!("tracing subscriber already installed");
    }
}

fn forward(level: Level, line: &str) {
    if level == Level::ERROR {
        console::error!(line);
    } else if level == Level::WARN {
        console::warn!(line);
    } else if level == Level::INFO {
        console::info!(line);
    } else {
        console::debug!(line);
    }
}
