use crate::app::{App, PLACEHOLDER_UNAVAILABLE, Panel, StatusLine};
use crate::state::app_settings::AppSettings;
use crate::state::messages::NetworkRequest;
use birdscore_api::card::{MatchCard, TeamBlock};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

const EMPTY_LIVE: &str = "試合中のコートはありません";
const EMPTY_FINISHED: &str = "終了試合はまだありません";
const SOURCE_LABEL: &str = "BIRDSCORE";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Tournament name and source link, printed once at startup.
pub fn header(settings: &AppSettings, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!(
            "{} | {SOURCE_LABEL} {}",
            settings.tournament_name, settings.source_url
        ),
        OutputFormat::Json => json!({
            "kind": "header",
            "tournament": settings.tournament_name,
            "source": { "label": SOURCE_LABEL, "url": settings.source_url },
        })
        .to_string(),
    }
}

/// Render the list touched by `request`, plus the status line.
pub fn draw(app: &App, request: NetworkRequest, format: OutputFormat, now: DateTime<Utc>) -> String {
    match (request, format) {
        (NetworkRequest::RefreshLive, OutputFormat::Text) => {
            let heading = "ライブ".to_owned();
            text_panel(&heading, &app.live, |b| &b.cards, EMPTY_LIVE, &app.status, now)
        }
        (NetworkRequest::RefreshFinished, OutputFormat::Text) => {
            let heading = match &app.finished {
                Panel::Ready { board, .. } => format!("終了試合 {}", board.today_label),
                _ => "終了試合".to_owned(),
            };
            text_panel(&heading, &app.finished, |b| &b.cards, EMPTY_FINISHED, &app.status, now)
        }
        (NetworkRequest::RefreshLive, OutputFormat::Json) => json_panel("live", &app.live, &app.status),
        (NetworkRequest::RefreshFinished, OutputFormat::Json) => {
            json_panel("finished", &app.finished, &app.status)
        }
    }
}

fn text_panel<T>(
    heading: &str,
    panel: &Panel<T>,
    cards: impl Fn(&T) -> &Vec<MatchCard>,
    empty: &str,
    status: &StatusLine,
    now: DateTime<Utc>,
) -> String {
    let mut out = Vec::new();
    match panel {
        Panel::Loading => out.push(format!("[{heading}] ...")),
        Panel::Unavailable => {
            out.push(format!("[{heading}]"));
            out.push(format!("  {PLACEHOLDER_UNAVAILABLE}"));
        }
        Panel::Ready { board, updated_at } => {
            let cards = cards(board);
            out.push(format!("[{heading}] {}件 ({})", cards.len(), age_label(*updated_at, now)));
            if cards.is_empty() {
                out.push(format!("  {empty}"));
            }
            out.extend(cards.iter().map(|card| format!("  {}", card_line(card))));
        }
    }
    if !status.text.is_empty() {
        let marker = if status.is_error { "!" } else { "-" };
        out.push(format!("{marker} {}", status.text));
    }
    out.join("\n")
}

/// One line per card: court, time, title, teams, games, duration.
pub fn card_line(card: &MatchCard) -> String {
    let mut parts = Vec::new();
    if let Some(court) = &card.court_label {
        parts.push(format!("コート{court}"));
    }
    if !card.time_text.is_empty() {
        parts.push(card.time_text.clone());
    }
    if !card.title.is_empty() {
        parts.push(card.title.clone());
    }
    parts.push(format!("{} vs {}", team_text(&card.left), team_text(&card.right)));

    let chips: Vec<String> = card
        .chips
        .iter()
        .map(|c| if c.current { format!("*{}", c.label) } else { c.label.clone() })
        .collect();
    if !chips.is_empty() {
        parts.push(chips.join(" "));
    }
    if !card.duration_text.is_empty() {
        parts.push(card.duration_text.clone());
    }
    parts.join("  ")
}

fn team_text(team: &TeamBlock) -> String {
    let entries: Vec<String> = team
        .entries
        .iter()
        .map(|e| match &e.belong {
            Some(belong) => format!("{} ({belong})", e.name),
            None => e.name.clone(),
        })
        .collect();
    entries.join(" / ")
}

/// Minutes-resolution age of a board.
fn age_label(updated_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - updated_at).num_minutes().max(0);
    if minutes == 0 {
        "just now".to_owned()
    } else {
        format!("{minutes} min ago")
    }
}

fn json_panel<T: Serialize>(kind: &str, panel: &Panel<T>, status: &StatusLine) -> String {
    let value = match panel {
        Panel::Loading => json!({ "kind": kind, "state": "loading" }),
        Panel::Unavailable => json!({
            "kind": kind,
            "state": "unavailable",
            "message": PLACEHOLDER_UNAVAILABLE,
            "status": status.text,
        }),
        Panel::Ready { board, updated_at } => json!({
            "kind": kind,
            "state": "ready",
            "updatedAt": updated_at.to_rfc3339(),
            "board": board,
        }),
    };
    value.to_string()
}
