//! Match cards: everything the presentation layer needs to show one contest.

use crate::lookup::BaseData;
use crate::score::{ScoreChip, ScoreLine, ScoreView, reconstruct, score_chips, score_lines};
use crate::{Court, Match, Order, OrderStatus, TeamIdentity};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;
use std::fmt::Display;

/// Affiliation placeholder used by the feed for "unknown".
const BLANK_BELONG: &str = "\u{3000}";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchCard {
    pub match_id: String,
    pub order_id: String,
    pub status: OrderStatus,
    /// Event and round labels, or the match number when both are blank.
    pub title: String,
    pub match_no: Option<String>,
    /// Only set for live cards.
    pub court_label: Option<String>,
    pub time_text: String,
    pub duration_text: String,
    pub times: TimeLabels,
    pub left: TeamBlock,
    pub right: TeamBlock,
    pub lines: Vec<ScoreLine>,
    pub chips: Vec<ScoreChip>,
    pub score: Option<ScoreView>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimeLabels {
    pub start_clock: String,
    pub end_clock: String,
    pub elapsed_minutes: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamBlock {
    pub label: String,
    pub entries: Vec<TeamEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamEntry {
    pub name: String,
    pub belong: Option<String>,
}

/// Card for a contest currently on `court`. Duration runs to `now`.
pub fn build_live_card(
    base: &BaseData,
    court: &Court,
    m: &Match,
    order: &Order,
    now: DateTime<Utc>,
) -> MatchCard {
    let mut card = build_card(base, m, order, now, &Local);
    card.court_label = Some(court.label.clone()).filter(|l| !l.is_empty());
    card.time_text = m.schedule_time.clone().unwrap_or_default();
    card
}

/// Card for a completed contest. Without a scheduled time, the end clock is shown.
pub fn build_finished_card(
    base: &BaseData,
    m: &Match,
    order: &Order,
    now: DateTime<Utc>,
) -> MatchCard {
    let mut card = build_card(base, m, order, now, &Local);
    card.time_text = match (&m.schedule_time, order.ended_at) {
        (Some(time), _) => time.clone(),
        (None, Some(_)) => card.times.end_clock.clone(),
        (None, None) => String::new(),
    };
    card
}

fn build_card<Tz>(
    base: &BaseData,
    m: &Match,
    order: &Order,
    now: DateTime<Utc>,
    tz: &Tz,
) -> MatchCard
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let title = card_title(base, m);
    let end = order.ended_at.unwrap_or_else(|| now.timestamp_millis());
    let elapsed = elapsed_minutes(order.started_at, end);
    let team = |index: usize| {
        order
            .sides
            .get(index)
            .and_then(|s| base.team(&s.team_id))
    };

    MatchCard {
        match_id: m.id.clone(),
        order_id: order.id.clone(),
        status: order.status,
        title,
        match_no: m.match_no.clone(),
        court_label: None,
        time_text: String::new(),
        duration_text: elapsed.map(|mins| format!("{mins}分")).unwrap_or_default(),
        times: TimeLabels {
            start_clock: format_clock(order.started_at, tz),
            end_clock: format_clock(order.ended_at, tz),
            elapsed_minutes: elapsed,
        },
        left: team_block(team(0)),
        right: team_block(team(1)),
        lines: score_lines(order),
        chips: score_chips(order),
        score: reconstruct(order, &base.config, &base.teams),
    }
}

/// "{event} {round}", skipping blanks; the match number when both are blank.
pub fn card_title(base: &BaseData, m: &Match) -> String {
    let parts: Vec<&str> = [base.event_label(&m.event_id), base.round_label(&m.round_id)]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        m.match_no.clone().unwrap_or_default()
    } else {
        parts.join(" ")
    }
}

/// One entry per player with affiliation, or the bare team label; "-" when unknown.
pub fn team_block(team: Option<&TeamIdentity>) -> TeamBlock {
    let Some(team) = team else {
        return TeamBlock {
            label: "-".to_owned(),
            entries: vec![TeamEntry { name: "-".to_owned(), belong: None }],
        };
    };

    let entries = if team.players.is_empty() {
        vec![TeamEntry { name: team.label.clone(), belong: None }]
    } else {
        team.players
            .iter()
            .map(|p| TeamEntry {
                name: if p.name.is_empty() { "-".to_owned() } else { p.name.clone() },
                belong: Some(p.belong.clone()).filter(|b| !b.is_empty() && b != BLANK_BELONG),
            })
            .collect()
    };

    TeamBlock {
        label: team.label.clone(),
        entries,
    }
}

// ---------------------------------------------------------------------------
// Time labels
// ---------------------------------------------------------------------------

/// `HH:MM` in `tz`, or `--:--` without a timestamp.
pub fn format_clock<Tz>(ts_ms: Option<i64>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts_ms
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.with_timezone(tz).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_owned())
}

/// Whole minutes from `start_ms` to `end_ms`, rounded and never negative.
pub fn elapsed_minutes(start_ms: Option<i64>, end_ms: i64) -> Option<i64> {
    let start = start_ms?;
    let millis = end_ms.saturating_sub(start).max(0);
    Some(millis.saturating_add(30_000) / 60_000)
}
