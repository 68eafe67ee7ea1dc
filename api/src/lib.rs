pub mod alias;
pub mod birdscore;
pub mod cache;
pub mod card;
pub mod client;
pub mod feed;
pub mod lookup;
pub mod score;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Domain types: clean model, independent of the BIRDSCORE wire format
// ---------------------------------------------------------------------------

/// Tournament-wide scoring rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Points needed to take a game. `None` disables the deuce column.
    pub game_point: Option<u32>,
}

impl Default for TournamentConfig {
    /// Used when the tournament payload carries no config block at all.
    fn default() -> Self {
        Self { game_point: Some(21) }
    }
}

impl TournamentConfig {
    /// Zero-based rally column where a game reaches deuce.
    pub fn deuce_column(&self) -> Option<usize> {
        self.game_point
            .filter(|&p| p > 0)
            .map(|p| p as usize - 1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchGroup {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    /// Affiliation after normalization and alias resolution.
    pub belong: String,
}

/// Display identity for one team (a single player or a doubles pair).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamIdentity {
    /// Never empty: "TBD" when no player name is known.
    pub label: String,
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Court {
    pub id: String,
    pub label: String,
    pub current_match_id: Option<String>,
    pub current_order_id: Option<String>,
}

impl Court {
    /// (match id, order id) when the court has a contest on it right now.
    /// A court with only one of the two ids set is idle.
    pub fn assignment(&self) -> Option<(&str, &str)> {
        let match_id = self.current_match_id.as_deref().filter(|s| !s.is_empty())?;
        let order_id = self.current_order_id.as_deref().filter(|s| !s.is_empty())?;
        Some((match_id, order_id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Match {
    pub id: String,
    pub event_id: String,
    pub round_id: String,
    pub schedule_time: Option<String>,
    pub match_no: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    NotStarted,
    InProgress,
    BetweenGames,
    Finished,
}

impl From<i64> for OrderStatus {
    fn from(code: i64) -> Self {
        match code {
            1 => OrderStatus::InProgress,
            2 | 3 => OrderStatus::BetweenGames,
            4 => OrderStatus::Finished,
            _ => OrderStatus::NotStarted,
        }
    }
}

/// One contest within a match: its live or final state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    /// 1-based game currently being played; only meaningful while in progress.
    pub active_game: Option<u32>,
    /// Epoch milliseconds.
    pub started_at: Option<i64>,
    pub ended_at: Option<i64>,
    /// Order-level game entries, one per declared game.
    pub games: Vec<Option<u32>>,
    pub sides: Vec<OrderSide>,
}

impl Order {
    pub fn is_finished(&self) -> bool {
        self.status == OrderStatus::Finished
    }

    /// True only while the order is in progress and `game` (1-based) is the
    /// active one.
    pub fn is_current_game(&self, game: usize) -> bool {
        self.status == OrderStatus::InProgress
            && self.active_game.map(|g| g as usize) == Some(game)
    }

    /// Index of the side that won more games, once the order is finished.
    /// A tie yields no winner.
    pub fn winning_side(&self) -> Option<usize> {
        if !self.is_finished() {
            return None;
        }
        let a = self.sides.first()?.games_won;
        let b = self.sides.get(1)?.games_won;
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => Some(0),
            std::cmp::Ordering::Less => Some(1),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSide {
    pub team_id: String,
    pub players: Vec<PlayerScores>,
    /// Final point per game; `None` where the feed has an entry without a point.
    pub finals: Vec<Option<u32>>,
    pub games_won: u32,
}

impl OrderSide {
    pub fn final_point(&self, game_index: usize) -> Option<u32> {
        self.finals.get(game_index).copied().flatten()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerScores {
    /// One running-score sequence per game; blank strings for empty cells.
    pub games: Vec<Vec<String>>,
}

impl PlayerScores {
    pub fn game(&self, game_index: usize) -> &[String] {
        self.games
            .get(game_index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
