use crate::birdscore::{
    CourtsResponse, RawCourt, RawMatch, RawOrder, RawOrderTeam, ScheduleResponse, TeamsResponse,
    TournamentResponse,
};
use crate::{Court, Match, Order, OrderSide, OrderStatus, PlayerScores};
use log::debug;
use reqwest::header::CACHE_CONTROL;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_BASE_URL: &str = "https://www.birdscore.live";
pub const DEFAULT_TOURNAMENT_ID: &str = "LQP3UkvciJmiVLqVsUcf";

/// Read-only client for one tournament on the BIRDSCORE JSON feed.
#[derive(Debug, Clone)]
pub struct BirdscoreApi {
    client: Client,
    base_url: String,
    tournament_id: String,
    timeout: Duration,
}

impl Default for BirdscoreApi {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_TOURNAMENT_ID)
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a response (timeout, DNS, reset).
    Network(reqwest::Error, String),
    /// The server answered with a non-2xx status.
    FetchFailed { status: StatusCode, url: String },
    Parsing(reqwest::Error, String),
    AliasLoad(String),
    Cache(String),
}

impl ApiError {
    /// Short category name for status lines.
    pub fn category(&self) -> &'static str {
        match self {
            ApiError::Network(..) => "network error",
            ApiError::FetchFailed { .. } => "fetch failed",
            ApiError::Parsing(..) => "unreadable response",
            ApiError::AliasLoad(_) => "alias load failed",
            ApiError::Cache(_) => "cache error",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::FetchFailed { status, url } => {
                write!(f, "Fetch failed: {} for {url}", status.as_u16())
            }
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::AliasLoad(msg) => write!(f, "Alias map load failed: {msg}"),
            ApiError::Cache(msg) => write!(f, "Cache error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl BirdscoreApi {
    pub fn new(base_url: impl Into<String>, tournament_id: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("birdscore/0.1 (live score poller)")
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            tournament_id: tournament_id.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tournament_id(&self) -> &str {
        &self.tournament_id
    }

    /// `tournament.json`: config, event groups, rounds and match groups.
    pub async fn fetch_tournament(&self) -> ApiResult<TournamentResponse> {
        self.fetch_resource(&self.path("tournament.json")).await
    }

    pub async fn fetch_teams(&self) -> ApiResult<TeamsResponse> {
        self.fetch_resource(&self.path("teams.json")).await
    }

    pub async fn fetch_courts(&self) -> ApiResult<Vec<Court>> {
        let raw: CourtsResponse = self.fetch_resource(&self.path("courts.json")).await?;
        Ok(raw.courts.into_iter().map(map_court).collect())
    }

    pub async fn fetch_schedule(&self) -> ApiResult<ScheduleResponse> {
        self.fetch_resource(&self.path("schedule.json")).await
    }

    pub async fn fetch_match(&self, match_id: &str) -> ApiResult<Match> {
        let path = self.path(&format!("matches/{match_id}/match.json"));
        let raw: RawMatch = self.fetch_resource(&path).await?;
        Ok(map_match(raw, match_id))
    }

    pub async fn fetch_order(&self, match_id: &str, order_id: &str) -> ApiResult<Order> {
        let path = self.path(&format!("matches/{match_id}/{order_id}/order.json"));
        let raw: RawOrder = self.fetch_resource(&path).await?;
        Ok(map_order(raw, order_id))
    }

    /// Match and order detail for one contest, fetched concurrently.
    pub async fn fetch_contest(&self, match_id: &str, order_id: &str) -> ApiResult<(Match, Order)> {
        futures_util::try_join!(self.fetch_match(match_id), self.fetch_order(match_id, order_id))
    }

    /// GET `{base}/{path}` and decode the JSON body. Never retries.
    pub async fn fetch_resource<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .header(CACHE_CONTROL, "no-cache")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::FetchFailed { status, url });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url))
    }

    fn path(&self, resource: &str) -> String {
        format!("json/{}/{resource}", self.tournament_id)
    }
}

// ---------------------------------------------------------------------------
// Mapping: BIRDSCORE wire types → clean domain types
// ---------------------------------------------------------------------------

fn map_court(raw: RawCourt) -> Court {
    Court {
        label: raw.court_name.unwrap_or_default(),
        id: raw.court_id,
        current_match_id: raw.current_match_id,
        current_order_id: raw.current_order_id,
    }
}

fn map_match(raw: RawMatch, requested_id: &str) -> Match {
    let id = if raw.match_id.is_empty() {
        requested_id.to_owned()
    } else {
        raw.match_id
    };
    Match {
        id,
        event_id: raw.event_id,
        round_id: raw.round_id,
        schedule_time: raw.schedule_time.filter(|s| !s.is_empty()),
        match_no: raw.match_no.filter(|s| !s.is_empty()),
    }
}

pub(crate) fn map_order(raw: RawOrder, requested_id: &str) -> Order {
    let id = if raw.order_id.is_empty() {
        requested_id.to_owned()
    } else {
        raw.order_id
    };
    Order {
        id,
        status: OrderStatus::from(raw.order_status),
        active_game: raw.game_count,
        started_at: raw.start_time.filter(|&t| t > 0),
        ended_at: raw.end_time.filter(|&t| t > 0),
        games: raw
            .game_infos
            .unwrap_or_default()
            .into_iter()
            .map(|g| g.point)
            .collect(),
        sides: raw.teams.into_iter().map(map_side).collect(),
    }
}

fn map_side(raw: RawOrderTeam) -> OrderSide {
    let players = raw
        .players
        .into_iter()
        .map(|p| PlayerScores {
            games: p
                .scores
                .into_iter()
                .map(|game| {
                    game.into_iter()
                        .map(|cell| cell.map(|c| c.to_string()).unwrap_or_default())
                        .collect()
                })
                .collect(),
        })
        .collect();

    OrderSide {
        team_id: raw.team_id,
        players,
        finals: raw.game_infos.into_iter().map(|g| g.point).collect(),
        games_won: raw.win_game_count.unwrap_or(0),
    }
}
