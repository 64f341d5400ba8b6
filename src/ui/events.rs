//! Application event handling.
//!
//! Background fetch completions arrive here, are applied to the feed state
//! and, when they changed something, the feed is printed again.

use newsreel::app::{App, AppEvent, ApplyOutcome, FetchKind};

use super::render::render_feed;

/// Apply one background event and print what changed.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    let kind = match &event {
        AppEvent::FeedLoaded { ticket, .. } => Some(ticket.kind),
        AppEvent::TaskPanicked { .. } => None,
    };

    if app.handle_event(event) == ApplyOutcome::Stale {
        return;
    }

    match kind {
        Some(FetchKind::More) => {
            // Append failures keep the list; show the reason once.
            if let Some(err) = app.feed.error() {
                let msg = format!("Could not load more: {}", err);
                app.set_status(msg);
            } else {
                print!("{}", render_feed(&app.feed));
            }
        }
        Some(FetchKind::Initial | FetchKind::Refresh) => print!("{}", render_feed(&app.feed)),
        None => {}
    }
}
