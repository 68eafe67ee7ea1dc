use birdscore_api::client::ApiError;
use birdscore_api::feed::{FinishedBoard, LiveBoard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkRequest {
    RefreshLive,
    RefreshFinished,
}

#[derive(Debug)]
pub enum NetworkResponse {
    LiveLoaded { board: LiveBoard },
    FinishedLoaded { board: FinishedBoard },
    /// The previous pass of the same kind was still running.
    Skipped { request: NetworkRequest },
    Error { request: NetworkRequest, error: ApiError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    AppStarted,
    ManualRefresh,
    Quit,
}
