// =============================================================================
// render.rs — PUTTING A PARCEL ON THE SCREEN
// =============================================================================
//
// Two sinks for a merged record:
//
// - render_text: the human layout. Labelled summary lines, then the event
//   history with provider names right-aligned so the timestamps line up.
// - render_json: the whole record through serde, for piping into jq.
//
// Colour is opt-in. The CLI only asks for it when stdout is a terminal.
// =============================================================================

use std::fmt::Write;

use crate::models::{ParcelEvent, ParcelInfo};

const LABEL: &str = "\x1b[95m";
const PROVIDER: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Events are indented this far past the longest provider name.
const EVENT_INDENT: usize = 3;

struct Palette {
    color: bool,
}

impl Palette {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{}{}{}", code, text, RESET)
        } else {
            text.to_string()
        }
    }
}

/// Human-readable multi-line summary of a parcel.
pub fn render_text(parcel: &ParcelInfo, color: bool) -> String {
    let palette = Palette { color };
    let mut out = String::new();

    let mut line = |label: &str, value: String| {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{}: {}", palette.paint(LABEL, label), value);
    };

    line("Tracking numbers", parcel.tracking_numbers.join(", "));
    line("To", parcel.destination.clone());
    line("Origin", parcel.origin.clone());
    line("Weight", format!("{}kg", parcel.weight_kg));
    line("Channel", parcel.channel.clone());
    line("Provider", parcel.provider_label.clone());
    line("Days in transit", parcel.days_in_transit.to_string());
    let _ = writeln!(out, "{}:", palette.paint(LABEL, "Events"));

    let widest = parcel
        .events()
        .iter()
        .map(|e| e.provider_name().chars().count())
        .max()
        .unwrap_or(0);

    for event in parcel.events() {
        let pad = widest - event.provider_name().chars().count() + EVENT_INDENT;
        let _ = writeln!(
            out,
            "{}{}",
            " ".repeat(pad),
            render_event(event, &palette)
        );
    }

    out
}

fn render_event(event: &ParcelEvent, palette: &Palette) -> String {
    let mut text = format!(
        "[{}] {}",
        palette.paint(PROVIDER, event.provider_name()),
        event.timestamp().format("%d.%m.%Y %H:%M:%S")
    );
    if let Some(location) = event.location() {
        text.push_str(" - ");
        text.push_str(location);
    }
    text.push_str(" - ");
    text.push_str(event.message());
    text
}

/// Pretty-printed JSON of the whole record, events included.
pub fn render_json(parcel: &ParcelInfo) -> serde_json::Result<String> {
    serde_json::to_string_pretty(parcel)
}
