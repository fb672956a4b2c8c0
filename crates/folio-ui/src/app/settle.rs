//! Timer driver for deferred settle refreshes.

use crate::core::clock::{Clock, SystemClock};
use crate::features::library::actions::MutationCoordinator;
use crate::services::api::HttpTransport;
use gloo::console;
use gloo_timers::future::TimeoutFuture;
use std::cell::Cell;
use std::rc::Rc;

/// Drain the settle schedule on a background task.
///
/// `armed` keeps a single driver alive; later uploads only add due entries.
pub(crate) fn arm(coordinator: Rc<MutationCoordinator<HttpTransport>>, armed: Rc<Cell<bool>>) {
    if armed.replace(true) {
        return;
    }
    yew::platform::spawn_local(async move {
        while let Some(due_at) = coordinator.next_settle_at() {
            let wait = due_at.saturating_sub(SystemClock.now_ms()).max(0);
            TimeoutFuture::new(u32::try_from(wait).unwrap_or(u32::MAX)).await;
            if let Some(Err(err)) = coordinator.settle_due().await {
                let detail = err.to_string();
                console::warn!("settle refresh failed", detail.as_str());
            }
        }
        armed.set(false);
    });
}
