use crate::state::messages::{NetworkRequest, NetworkResponse};
use birdscore_api::feed::Feed;
use log::{debug, error};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Receives refresh requests and runs each one as its own task, so a slow
/// pass never delays the next trigger. Overlap is decided by the feed's
/// busy guards.
pub struct NetworkWorker {
    feed: Arc<Feed>,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
}

impl NetworkWorker {
    pub fn new(
        feed: Arc<Feed>,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            feed,
            requests,
            responses,
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let feed = self.feed.clone();
            let responses = self.responses.clone();
            tokio::spawn(async move {
                let response = handle_request(&feed, request).await;
                if let Err(e) = responses.send(response).await {
                    error!("Failed to send network response: {e}");
                }
            });
        }
    }
}

pub async fn handle_request(feed: &Feed, request: NetworkRequest) -> NetworkResponse {
    debug!("network request {request:?}");
    let result = match request {
        NetworkRequest::RefreshLive => feed
            .poll_live()
            .await
            .map(|board| board.map(|board| NetworkResponse::LiveLoaded { board })),
        NetworkRequest::RefreshFinished => feed
            .poll_finished()
            .await
            .map(|board| board.map(|board| NetworkResponse::FinishedLoaded { board })),
    };

    match result {
        Ok(Some(response)) => response,
        Ok(None) => NetworkResponse::Skipped { request },
        Err(error) => NetworkResponse::Error { request, error },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use birdscore_api::alias::AliasMap;
    use birdscore_api::cache::{DEFAULT_TTL, TtlCache};
    use birdscore_api::client::{ApiError, BirdscoreApi};
    use birdscore_api::feed::FeedConfig;

    fn unreachable_feed() -> Feed {
        Feed::new(
            BirdscoreApi::new("http://127.0.0.1:9", "T1"),
            TtlCache::in_memory(DEFAULT_TTL),
            AliasMap::identity(),
            FeedConfig::default(),
        )
    }

    #[tokio::test]
    async fn failed_pass_reports_which_request_failed() {
        let feed = unreachable_feed();
        match handle_request(&feed, NetworkRequest::RefreshFinished).await {
            NetworkResponse::Error { request, error } => {
                assert_eq!(request, NetworkRequest::RefreshFinished);
                assert!(matches!(error, ApiError::Network(..)));
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[tokio::test]
    async fn worker_answers_every_request() {
        let (req_tx, req_rx) = mpsc::channel(4);
        let (resp_tx, mut resp_rx) = mpsc::channel(4);
        let worker = NetworkWorker::new(Arc::new(unreachable_feed()), req_rx, resp_tx);
        let task = tokio::spawn(worker.run());

        req_tx.send(NetworkRequest::RefreshLive).await.unwrap();
        let response = resp_rx.recv().await.unwrap();
        assert!(matches!(
            response,
            NetworkResponse::Error { request: NetworkRequest::RefreshLive, .. }
        ));
        task.abort();
    }
}
