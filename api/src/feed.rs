//! Live and finished aggregators.
//!
//! Each poll fans out match/order fetches in parallel and returns a board of
//! cards in a deterministic order. Both polls are single-flight: a call that
//! starts while the previous one is still running returns `Ok(None)`.

use crate::alias::AliasMap;
use crate::birdscore::{ScheduleResponse, TeamsResponse, TournamentResponse};
use crate::cache::{DEFAULT_TTL, TtlCache};
use crate::card::{MatchCard, build_finished_card, build_live_card};
use crate::client::{ApiError, ApiResult, BirdscoreApi};
use crate::lookup::{BaseData, today_group_ids, today_label};
use crate::{Match, Order, OrderStatus};
use chrono::{Local, NaiveDate, Utc};
use futures_util::future::try_join_all;
use log::debug;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;

pub const DEFAULT_FINISHED_LIMIT: usize = 6;

#[derive(Debug, Clone, Copy)]
pub struct FeedConfig {
    /// Upper bound on finished orders fetched and shown per poll.
    pub finished_limit: usize,
    pub cache_ttl: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            finished_limit: DEFAULT_FINISHED_LIMIT,
            cache_ttl: DEFAULT_TTL,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiveBoard {
    pub count: usize,
    pub cards: Vec<MatchCard>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinishedBoard {
    /// Today's match group name, or the bare `MM/DD` date.
    pub today_label: String,
    pub count: usize,
    pub cards: Vec<MatchCard>,
}

/// Non-blocking try-acquire on a busy flag; released on drop.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Feed {
    api: BirdscoreApi,
    cache: TtlCache,
    aliases: AliasMap,
    config: FeedConfig,
    base: OnceCell<Arc<BaseData>>,
    live_busy: AtomicBool,
    finished_busy: AtomicBool,
}

impl Feed {
    pub fn new(api: BirdscoreApi, cache: TtlCache, aliases: AliasMap, config: FeedConfig) -> Self {
        Self {
            api,
            cache,
            aliases,
            config,
            base: OnceCell::new(),
            live_busy: AtomicBool::new(false),
            finished_busy: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Tournament and team lookups, loaded on first use. Concurrent first
    /// callers share one load; a failed load is retried by the next caller.
    pub async fn base_data(&self) -> ApiResult<Arc<BaseData>> {
        self.base
            .get_or_try_init(|| self.load_base_data())
            .await
            .cloned()
    }

    async fn load_base_data(&self) -> ApiResult<Arc<BaseData>> {
        let id = self.api.tournament_id();
        let tournament: TournamentResponse = self
            .cache
            .get_or_load(&format!("{id}:tournament"), || self.api.fetch_tournament())
            .await?;
        let teams: TeamsResponse = self
            .cache
            .get_or_load(&format!("{id}:teams"), || self.api.fetch_teams())
            .await?;
        debug!(
            "base data ready: {} teams, {} events, {} rounds",
            teams.teams.len(),
            tournament.tournament_events.len(),
            tournament.rounds.len()
        );
        Ok(Arc::new(BaseData::build(&tournament, &teams, &self.aliases)))
    }

    /// One card per court that has both a current match and a current order,
    /// in court order.
    pub async fn poll_live(&self) -> ApiResult<Option<LiveBoard>> {
        let Some(_guard) = BusyGuard::try_acquire(&self.live_busy) else {
            debug!("live poll already in flight; skipped");
            return Ok(None);
        };

        let base = self.base_data().await?;
        let base = base.as_ref();
        let courts = self.api.fetch_courts().await?;
        let now = Utc::now();

        let cards = try_join_all(
            courts
                .iter()
                .filter_map(|court| court.assignment().map(|ids| (court, ids)))
                .map(|(court, (match_id, order_id))| async move {
                    let (m, order) = self.api.fetch_contest(match_id, order_id).await?;
                    Ok::<_, ApiError>(build_live_card(base, court, &m, &order, now))
                }),
        )
        .await?;

        debug!("live poll: {} active courts", cards.len());
        Ok(Some(LiveBoard { count: cards.len(), cards }))
    }

    pub async fn poll_finished(&self) -> ApiResult<Option<FinishedBoard>> {
        self.poll_finished_on(Local::now().date_naive()).await
    }

    /// The most recently completed orders, newest end time first, treating
    /// `today` as the play date.
    pub async fn poll_finished_on(&self, today: NaiveDate) -> ApiResult<Option<FinishedBoard>> {
        let Some(_guard) = BusyGuard::try_acquire(&self.finished_busy) else {
            debug!("finished poll already in flight; skipped");
            return Ok(None);
        };

        let base = self.base_data().await?;
        let schedule = self.api.fetch_schedule().await?;
        let limit = self.config.finished_limit;

        let today_ids = today_group_ids(&base.match_groups, today);
        let candidates = finished_candidates(&schedule, &today_ids, limit);
        debug!("finished poll: fetching {} candidates", candidates.len());

        let contests = try_join_all(
            candidates
                .iter()
                .map(|(match_id, order_id)| self.api.fetch_contest(match_id, order_id)),
        )
        .await?;

        let now = Utc::now();
        let cards: Vec<MatchCard> = latest_finished(contests, limit)
            .iter()
            .map(|(m, order)| build_finished_card(&base, m, order, now))
            .collect();

        Ok(Some(FinishedBoard {
            today_label: today_label(&base.match_groups, today),
            count: cards.len(),
            cards,
        }))
    }
}

/// Finished (match id, order id) pairs in discovery order, restricted to
/// today's groups when there are any, keeping only the last `limit`.
pub fn finished_candidates(
    schedule: &ScheduleResponse,
    today_ids: &[String],
    limit: usize,
) -> Vec<(String, String)> {
    let group_ids: Vec<&str> = if today_ids.is_empty() {
        schedule.group_ids().collect()
    } else {
        today_ids.iter().map(String::as_str).collect()
    };

    let finished: Vec<(String, String)> = group_ids
        .into_iter()
        .flat_map(|id| schedule.group(id))
        .flat_map(|m| {
            m.orders
                .iter()
                .filter(|o| OrderStatus::from(o.order_status) == OrderStatus::Finished)
                .map(|o| (m.match_id.clone(), o.order_id.clone()))
        })
        .collect();

    let skip = finished.len().saturating_sub(limit);
    finished.into_iter().skip(skip).collect()
}

/// Drop contests without an end time, newest first, at most `limit`.
pub fn latest_finished(mut contests: Vec<(Match, Order)>, limit: usize) -> Vec<(Match, Order)> {
    contests.retain(|(_, order)| order.ended_at.is_some());
    contests.sort_by(|(_, a), (_, b)| b.ended_at.cmp(&a.ended_at));
    contests.truncate(limit);
    contests
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(json: &str) -> ScheduleResponse {
        serde_json::from_str(json).unwrap()
    }

    fn finished_schedule() -> ScheduleResponse {
        schedule(
            r#"{"matches": {
                "g1": [
                    {"matchId": "m1", "orders": [{"orderId": "a", "orderStatus": 4}, {"orderId": "b", "orderStatus": 1}]},
                    {"matchId": "m2", "orders": [{"orderId": "c", "orderStatus": 4}]}
                ],
                "g2": [
                    {"matchId": "m3", "orders": [{"orderId": "d", "orderStatus": 4}, {"orderId": "e", "orderStatus": 4}]},
                    {"matchId": "m4", "orders": [{"orderId": "f", "orderStatus": 0}]}
                ]
            }}"#,
        )
    }

    fn ids(pairs: &[(String, String)]) -> Vec<String> {
        pairs.iter().map(|(m, o)| format!("{m}/{o}")).collect()
    }

    #[test]
    fn candidates_use_all_groups_when_none_are_today() {
        let c = finished_candidates(&finished_schedule(), &[], 6);
        assert_eq!(ids(&c), vec!["m1/a", "m2/c", "m3/d", "m3/e"]);
    }

    #[test]
    fn candidates_keep_the_most_recently_discovered() {
        let c = finished_candidates(&finished_schedule(), &[], 2);
        assert_eq!(ids(&c), vec!["m3/d", "m3/e"]);
    }

    #[test]
    fn candidates_restricted_to_today_groups() {
        let c = finished_candidates(&finished_schedule(), &["g1".to_string()], 6);
        assert_eq!(ids(&c), vec!["m1/a", "m2/c"]);
        let none = finished_candidates(&finished_schedule(), &["g9".to_string()], 6);
        assert!(none.is_empty());
    }

    #[test]
    fn latest_finished_drops_missing_end_and_sorts_desc() {
        let contest = |id: &str, end: Option<i64>| {
            (
                Match { id: id.into(), ..Default::default() },
                Order { ended_at: end, ..Default::default() },
            )
        };
        let picked = latest_finished(
            vec![
                contest("a", Some(100)),
                contest("b", None),
                contest("c", Some(300)),
                contest("d", Some(200)),
            ],
            2,
        );
        let order: Vec<&str> = picked.iter().map(|(m, _)| m.id.as_str()).collect();
        assert_eq!(order, vec!["c", "d"]);
    }

    #[test]
    fn busy_guard_is_exclusive_until_dropped() {
        let flag = AtomicBool::new(false);
        let first = BusyGuard::try_acquire(&flag);
        assert!(first.is_some());
        assert!(BusyGuard::try_acquire(&flag).is_none());
        drop(first);
        assert!(BusyGuard::try_acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn overlapping_poll_is_a_no_op() {
        // Unroutable base: any network access would fail the call.
        let api = BirdscoreApi::new("http://127.0.0.1:9", "T1");
        let feed = Feed::new(api, TtlCache::in_memory(DEFAULT_TTL), AliasMap::identity(), FeedConfig::default());

        feed.live_busy.store(true, Ordering::SeqCst);
        assert!(matches!(feed.poll_live().await, Ok(None)));
        assert!(feed.live_busy.load(Ordering::SeqCst), "skipped poll must not clear the flag");

        feed.finished_busy.store(true, Ordering::SeqCst);
        assert!(matches!(feed.poll_finished().await, Ok(None)));
    }
}
