use crate::state::app_settings::AppSettings;
use crate::state::messages::NetworkRequest;
use birdscore_api::client::ApiError;
use birdscore_api::feed::{FinishedBoard, LiveBoard};
use chrono::{DateTime, Utc};
use log::debug;

pub const PLACEHOLDER_UNAVAILABLE: &str = "取得できませんでした";
pub const STATUS_UPDATED: &str = "更新完了";
pub const STATUS_REFRESHING: &str = "更新中...";

/// What one list currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Panel<T> {
    #[default]
    Loading,
    Ready {
        board: T,
        updated_at: DateTime<Utc>,
    },
    /// The last pass failed; nothing from it is kept.
    Unavailable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    pub settings: AppSettings,
    pub live: Panel<LiveBoard>,
    pub finished: Panel<FinishedBoard>,
    pub status: StatusLine,
}

impl App {
    pub fn new() -> Self {
        Self::with_settings(AppSettings::load())
    }

    pub fn with_settings(settings: AppSettings) -> Self {
        Self {
            settings,
            live: Panel::Loading,
            finished: Panel::Loading,
            status: StatusLine::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_loop
    // -----------------------------------------------------------------------

    pub fn on_refresh_requested(&mut self) {
        self.status = StatusLine {
            text: STATUS_REFRESHING.to_owned(),
            is_error: false,
        };
    }

    pub fn on_live_loaded(&mut self, board: LiveBoard) {
        self.live = Panel::Ready {
            board,
            updated_at: Utc::now(),
        };
        self.status = StatusLine {
            text: STATUS_UPDATED.to_owned(),
            is_error: false,
        };
    }

    pub fn on_finished_loaded(&mut self, board: FinishedBoard) {
        self.finished = Panel::Ready {
            board,
            updated_at: Utc::now(),
        };
    }

    pub fn on_skipped(&mut self, request: NetworkRequest) {
        debug!("{request:?} skipped: previous pass still running");
    }

    pub fn on_error(&mut self, request: NetworkRequest, error: &ApiError) {
        let list = match request {
            NetworkRequest::RefreshLive => {
                self.live = Panel::Unavailable;
                "ライブ情報"
            }
            NetworkRequest::RefreshFinished => {
                self.finished = Panel::Unavailable;
                "終了試合"
            }
        };
        self.status = StatusLine {
            text: format!("{list}の取得に失敗しました ({})", error.category()),
            is_error: true,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::with_settings(AppSettings {
            base_url: "http://localhost".into(),
            tournament_id: "T1".into(),
            tournament_name: "テスト大会".into(),
            source_url: "https://www.birdscore.live/web/test/".into(),
            cache_file: "cache.json".into(),
            aliases_file: None,
        })
    }

    fn cache_error() -> ApiError {
        ApiError::Cache("disk full".into())
    }

    #[test]
    fn error_replaces_only_the_failed_list() {
        let mut app = app();
        app.on_live_loaded(LiveBoard::default());
        app.on_finished_loaded(FinishedBoard::default());

        app.on_error(NetworkRequest::RefreshLive, &cache_error());
        assert_eq!(app.live, Panel::Unavailable);
        assert!(matches!(app.finished, Panel::Ready { .. }));
        assert!(app.status.is_error);
        assert_eq!(app.status.text, "ライブ情報の取得に失敗しました (cache error)");
    }

    #[test]
    fn success_after_error_clears_status() {
        let mut app = app();
        app.on_error(NetworkRequest::RefreshLive, &cache_error());
        app.on_live_loaded(LiveBoard::default());
        assert!(!app.status.is_error);
        assert_eq!(app.status.text, STATUS_UPDATED);
    }

    #[test]
    fn skipped_pass_changes_nothing() {
        let mut app = app();
        app.on_skipped(NetworkRequest::RefreshFinished);
        assert_eq!(app.finished, Panel::Loading);
        assert_eq!(app.status, StatusLine::default());
    }
}
