//! Lookup tables built from the slow-changing tournament and team payloads.

use crate::alias::{AliasMap, normalize_name};
use crate::birdscore::{RawMatchGroup, TeamsResponse, TournamentResponse};
use crate::{MatchGroup, Player, TeamIdentity, TournamentConfig};
use chrono::NaiveDate;
use std::collections::HashMap;

pub const TBD_LABEL: &str = "TBD";

/// Everything the score and card builders need to label a contest.
/// Built once per process and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct BaseData {
    pub config: TournamentConfig,
    pub teams: HashMap<String, TeamIdentity>,
    pub events: HashMap<String, String>,
    pub rounds: HashMap<String, String>,
    pub match_groups: Vec<MatchGroup>,
}

impl BaseData {
    pub fn build(tournament: &TournamentResponse, teams: &TeamsResponse, aliases: &AliasMap) -> Self {
        Self {
            config: tournament_config(tournament),
            teams: build_team_map(teams, aliases),
            events: build_event_map(tournament),
            rounds: build_round_map(tournament),
            match_groups: tournament.match_groups.iter().map(map_match_group).collect(),
        }
    }

    pub fn team(&self, team_id: &str) -> Option<&TeamIdentity> {
        self.teams.get(team_id)
    }

    pub fn event_label(&self, event_id: &str) -> &str {
        self.events.get(event_id).map(String::as_str).unwrap_or("")
    }

    pub fn round_label(&self, round_id: &str) -> &str {
        self.rounds.get(round_id).map(String::as_str).unwrap_or("")
    }
}

/// A missing config block means the standard 21-point game.
pub fn tournament_config(tournament: &TournamentResponse) -> TournamentConfig {
    match &tournament.config {
        Some(raw) => TournamentConfig {
            game_point: raw.game_point.filter(|&p| p > 0),
        },
        None => TournamentConfig::default(),
    }
}

pub fn build_team_map(teams: &TeamsResponse, aliases: &AliasMap) -> HashMap<String, TeamIdentity> {
    teams
        .teams
        .iter()
        .map(|team| {
            let players: Vec<Player> = team
                .players
                .iter()
                .map(|p| {
                    let belong = normalize_name(p.belong.as_deref().unwrap_or_default());
                    Player {
                        name: normalize_name(p.player_name.as_deref().unwrap_or_default()),
                        belong: aliases.resolve(&belong).to_owned(),
                    }
                })
                .collect();
            let label = team_label(&players);
            (team.team_id.clone(), TeamIdentity { label, players })
        })
        .collect()
}

/// Non-empty player names joined with " / ", or "TBD".
pub fn team_label(players: &[Player]) -> String {
    let names: Vec<&str> = players
        .iter()
        .map(|p| p.name.as_str())
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        TBD_LABEL.to_owned()
    } else {
        names.join(" / ")
    }
}

/// event id → owning group's title, else the event's class, else "".
pub fn build_event_map(tournament: &TournamentResponse) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for group in &tournament.tournament_events {
        for event in &group.events {
            let label = group
                .title
                .as_deref()
                .filter(|t| !t.is_empty())
                .or(event.class.as_deref())
                .unwrap_or_default();
            map.insert(event.event_id.clone(), label.to_owned());
        }
    }
    map
}

pub fn build_round_map(tournament: &TournamentResponse) -> HashMap<String, String> {
    tournament
        .rounds
        .iter()
        .map(|r| (r.round_id.clone(), r.round_name.clone()))
        .collect()
}

fn map_match_group(raw: &RawMatchGroup) -> MatchGroup {
    MatchGroup {
        id: raw.match_group_id.clone(),
        name: raw.match_group_name.clone(),
    }
}

/// `MM/DD` as used at the front of match group names.
pub fn date_prefix(today: NaiveDate) -> String {
    today.format("%m/%d").to_string()
}

/// Ids of the match groups played on `today`, in tournament order.
/// Empty when none match; callers then consider every group.
pub fn today_group_ids(groups: &[MatchGroup], today: NaiveDate) -> Vec<String> {
    let prefix = date_prefix(today);
    groups
        .iter()
        .filter(|g| g.name.starts_with(&prefix))
        .map(|g| g.id.clone())
        .collect()
}

/// Heading for the day: today's group name, or just the date prefix.
pub fn today_label(groups: &[MatchGroup], today: NaiveDate) -> String {
    let prefix = date_prefix(today);
    groups
        .iter()
        .find(|g| g.name.starts_with(&prefix))
        .map(|g| g.name.clone())
        .unwrap_or(prefix)
}
