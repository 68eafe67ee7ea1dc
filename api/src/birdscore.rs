//! BIRDSCORE raw wire types: serde shapes for the `json/{tournamentId}/...` feed.
//! These map to the clean domain types in lib.rs via the mapping functions in client.rs.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// tournament.json
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TournamentResponse {
    pub config: Option<RawConfig>,
    #[serde(default)]
    pub tournament_events: Vec<RawEventGroup>,
    #[serde(default)]
    pub rounds: Vec<RawRound>,
    #[serde(default)]
    pub match_groups: Vec<RawMatchGroup>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    pub game_point: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct RawEventGroup {
    pub title: Option<String>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default, deserialize_with = "flex_string")]
    pub event_id: String,
    /// Discipline class ("男子シングルス" etc.); used when the group has no title.
    pub class: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawRound {
    #[serde(default, deserialize_with = "flex_string")]
    pub round_id: String,
    #[serde(default)]
    pub round_name: String,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawMatchGroup {
    #[serde(default, deserialize_with = "flex_string")]
    pub match_group_id: String,
    /// Starts with the play date as `MM/DD`, e.g. "12/27 (土)".
    #[serde(default)]
    pub match_group_name: String,
}

// ---------------------------------------------------------------------------
// teams.json
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct TeamsResponse {
    #[serde(default)]
    pub teams: Vec<RawTeam>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawTeam {
    #[serde(default, deserialize_with = "flex_string")]
    pub team_id: String,
    #[serde(default)]
    pub players: Vec<RawTeamPlayer>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawTeamPlayer {
    pub player_name: Option<String>,
    /// Affiliation; a lone full-width space when unknown.
    pub belong: Option<String>,
}

// ---------------------------------------------------------------------------
// courts.json
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CourtsResponse {
    #[serde(default)]
    pub courts: Vec<RawCourt>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawCourt {
    #[serde(default, deserialize_with = "flex_string")]
    pub court_id: String,
    /// Usually a bare court number.
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub court_name: Option<String>,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub current_match_id: Option<String>,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub current_order_id: Option<String>,
}

// ---------------------------------------------------------------------------
// schedule.json
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ScheduleResponse {
    /// matchGroupId → matches, kept in document order.
    #[serde(default, deserialize_with = "ordered_groups")]
    pub matches: Vec<(String, Vec<RawScheduledMatch>)>,
}

impl ScheduleResponse {
    pub fn group(&self, group_id: &str) -> &[RawScheduledMatch] {
        self.matches
            .iter()
            .find(|(id, _)| id == group_id)
            .map(|(_, matches)| matches.as_slice())
            .unwrap_or_default()
    }

    pub fn group_ids(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|(id, _)| id.as_str())
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawScheduledMatch {
    #[serde(default, deserialize_with = "flex_string")]
    pub match_id: String,
    #[serde(default)]
    pub orders: Vec<RawScheduledOrder>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawScheduledOrder {
    #[serde(default, deserialize_with = "flex_string")]
    pub order_id: String,
    #[serde(default)]
    pub order_status: i64,
}

// ---------------------------------------------------------------------------
// matches/{matchId}/match.json
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawMatch {
    #[serde(default, deserialize_with = "flex_string")]
    pub match_id: String,
    #[serde(default, deserialize_with = "flex_string")]
    pub event_id: String,
    #[serde(default, deserialize_with = "flex_string")]
    pub round_id: String,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub schedule_time: Option<String>,
    #[serde(default, deserialize_with = "flex_opt_string")]
    pub match_no: Option<String>,
}

// ---------------------------------------------------------------------------
// matches/{matchId}/{orderId}/order.json
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    #[serde(default, deserialize_with = "flex_string")]
    pub order_id: String,
    #[serde(default)]
    pub order_status: i64,
    /// Active game number (1-based) while the order is in progress.
    pub game_count: Option<u32>,
    /// Epoch milliseconds.
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub game_infos: Option<Vec<RawGameInfo>>,
    #[serde(default)]
    pub teams: Vec<RawOrderTeam>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RawOrderTeam {
    #[serde(default, deserialize_with = "flex_string")]
    pub team_id: String,
    #[serde(default)]
    pub players: Vec<RawOrderPlayer>,
    #[serde(default)]
    pub game_infos: Vec<RawGameInfo>,
    pub win_game_count: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawOrderPlayer {
    /// One running-score sequence per game.
    #[serde(default)]
    pub scores: Vec<Vec<Option<RawRally>>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawGameInfo {
    pub point: Option<u32>,
}

/// A single rally cell. The feed mixes numbers with text markers.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawRally {
    Point(i64),
    Mark(String),
}

impl fmt::Display for RawRally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawRally::Point(p) => write!(f, "{p}"),
            RawRally::Mark(m) => f.write_str(m),
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoders
// ---------------------------------------------------------------------------

/// Accept a string or a number; anything else becomes "".
fn flex_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(flex_opt_string(deserializer)?.unwrap_or_default())
}

fn flex_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Decode a JSON object into (key, value) pairs without losing key order.
fn ordered_groups<'de, D>(deserializer: D) -> Result<Vec<(String, Vec<RawScheduledMatch>)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct GroupsVisitor;

    impl<'de> Visitor<'de> for GroupsVisitor {
        type Value = Vec<(String, Vec<RawScheduledMatch>)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of match group id to scheduled matches")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut groups = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((id, matches)) =
                map.next_entry::<String, Option<Vec<RawScheduledMatch>>>()?
            {
                groups.push((id, matches.unwrap_or_default()));
            }
            Ok(groups)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(GroupsVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_keeps_group_order() {
        let raw = r#"{"matches": {
            "zz": [{"matchId": "m1", "orders": [{"orderId": "o1", "orderStatus": 4}]}],
            "aa": [],
            "mm": null
        }}"#;
        let schedule: ScheduleResponse = serde_json::from_str(raw).unwrap();
        let ids: Vec<&str> = schedule.group_ids().collect();
        assert_eq!(ids, vec!["zz", "aa", "mm"]);
        assert_eq!(schedule.group("zz")[0].orders[0].order_status, 4);
        assert!(schedule.group("missing").is_empty());
    }

    #[test]
    fn court_name_accepts_numbers() {
        let raw = r#"{"courts": [
            {"courtId": 3, "courtName": 3, "currentMatchId": "m", "currentOrderId": null},
            {"courtId": "c4", "courtName": "4"}
        ]}"#;
        let courts: CourtsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(courts.courts[0].court_id, "3");
        assert_eq!(courts.courts[0].court_name.as_deref(), Some("3"));
        assert_eq!(courts.courts[0].current_order_id, None);
        assert_eq!(courts.courts[1].current_match_id, None);
    }

    #[test]
    fn rally_cells_mix_numbers_text_and_null() {
        let raw = r#"{"scores": [[0, 1, null, "R", 2]]}"#;
        let player: RawOrderPlayer = serde_json::from_str(raw).unwrap();
        let cells: Vec<String> = player.scores[0]
            .iter()
            .map(|c| c.as_ref().map(ToString::to_string).unwrap_or_default())
            .collect();
        assert_eq!(cells, vec!["0", "1", "", "R", "2"]);
    }
}
