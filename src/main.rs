mod app;
mod draw;
mod state;

use crate::app::App;
use crate::draw::OutputFormat;
use crate::state::app_settings::AppSettings;
use crate::state::messages::{NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{NetworkWorker, handle_request};
use crate::state::refresher::PeriodicRefresher;
use birdscore_api::alias::AliasMap;
use birdscore_api::cache::{FileStore, TtlCache};
use birdscore_api::client::BirdscoreApi;
use birdscore_api::feed::{Feed, FeedConfig};
use chrono::Utc;
use log::{error, info};
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RunOptions {
    once: bool,
    format: OutputFormat,
}

#[derive(Debug, PartialEq, Eq)]
enum CliAction {
    Run(RunOptions),
    Help,
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(options) = handle_cli_args() else {
        return Ok(());
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let app = App::new();
    let feed = Arc::new(build_feed(&app.settings));
    println!("{}", draw::header(&app.settings, options.format));

    if options.once {
        return run_once(app, &feed, options.format).await;
    }

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    // Manual refresh from stdin. A plain thread: a pending read must not hold up exit.
    let input_tx = ui_event_tx.clone();
    std::thread::spawn(move || input_handler(std::io::stdin().lock(), input_tx));

    // Network thread
    let network_worker = NetworkWorker::new(feed, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    // Live every 10s, finished every 60s
    let periodic_updater = PeriodicRefresher::new(network_req_tx.clone());
    let periodic_task = tokio::spawn(periodic_updater.run());

    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_loop(app, options.format, ui_event_rx, network_req_tx, network_resp_rx).await;

    network_task.abort();
    periodic_task.abort();

    Ok(())
}

fn handle_cli_args() -> Option<RunOptions> {
    match parse_args(std::env::args().skip(1)) {
        Ok(CliAction::Run(options)) => Some(options),
        Ok(CliAction::Help) => {
            println!("{}", usage_text());
            None
        }
        Ok(CliAction::Version) => {
            println!("birdscore {}", env!("CARGO_PKG_VERSION"));
            None
        }
        Err(arg) => {
            eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
            std::process::exit(2);
        }
    }
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<CliAction, String> {
    let mut options = RunOptions::default();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "-V" | "--version" => return Ok(CliAction::Version),
            "--once" => options.once = true,
            "--json" => options.format = OutputFormat::Json,
            _ => return Err(arg),
        }
    }
    Ok(CliAction::Run(options))
}

fn usage_text() -> &'static str {
    "birdscore - live and finished badminton matches from BIRDSCORE

Usage:
  birdscore [--once] [--json]
  birdscore --help
  birdscore --version

Options:
  --once     Run one live and one finished pass, print them and exit
  --json     Print each board as a JSON line instead of text

While running, press Enter to refresh both lists; type q to quit.

Environment:
  BIRDSCORE_BASE_URL       Feed origin (default https://www.birdscore.live)
  BIRDSCORE_TOURNAMENT_ID  Tournament to follow
  BIRDSCORE_TOURNAMENT_NAME  Header title (default: the bundled tournament's name)
  BIRDSCORE_SOURCE_URL     BIRDSCORE page linked in the header
  BIRDSCORE_CACHE_FILE     Tournament/team cache file (default in the temp dir)
  BIRDSCORE_ALIASES        Affiliation alias JSON overriding the bundled table
  RUST_LOG                 Log filter (default warn)"
}

fn build_feed(settings: &AppSettings) -> Feed {
    let config = FeedConfig::default();
    let aliases = AliasMap::load_or_identity(settings.aliases_file.as_deref());
    let cache = TtlCache::new(FileStore::new(&settings.cache_file), config.cache_ttl);
    let api = BirdscoreApi::new(&settings.base_url, &settings.tournament_id);
    info!(
        "following tournament {} at {} ({} aliases)",
        settings.tournament_id,
        settings.base_url,
        aliases.len()
    );
    Feed::new(api, cache, aliases, config)
}

async fn run_once(mut app: App, feed: &Feed, format: OutputFormat) -> anyhow::Result<()> {
    let (live, finished) = tokio::join!(
        handle_request(feed, NetworkRequest::RefreshLive),
        handle_request(feed, NetworkRequest::RefreshFinished),
    );

    let mut failed = 0;
    for response in [live, finished] {
        if matches!(response, NetworkResponse::Error { .. }) {
            failed += 1;
        }
        if let Some(panel) = handle_network_response(response, &mut app) {
            println!("{}", draw::draw(&app, panel, format, Utc::now()));
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of 2 lists could not be retrieved");
    }
    Ok(())
}

async fn main_loop(
    mut app: App,
    format: OutputFormat,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
) {
    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                if !handle_ui_event(ui_event, &mut app, &network_requests).await {
                    break;
                }
            }

            Some(response) = network_responses.recv() => {
                if let Some(panel) = handle_network_response(response, &mut app) {
                    println!("{}", draw::draw(&app, panel, format, Utc::now()));
                }
            }

            else => break,
        }
    }
}

/// Returns false when the loop should stop.
async fn handle_ui_event(
    ui_event: UiEvent,
    app: &mut App,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> bool {
    match ui_event {
        UiEvent::AppStarted | UiEvent::ManualRefresh => {
            app.on_refresh_requested();
            for request in [NetworkRequest::RefreshLive, NetworkRequest::RefreshFinished] {
                if network_requests.send(request).await.is_err() {
                    return false;
                }
            }
            true
        }
        UiEvent::Quit => false,
    }
}

/// Apply a response to the app; returns the list that needs redrawing.
fn handle_network_response(response: NetworkResponse, app: &mut App) -> Option<NetworkRequest> {
    match response {
        NetworkResponse::LiveLoaded { board } => {
            app.on_live_loaded(board);
            Some(NetworkRequest::RefreshLive)
        }
        NetworkResponse::FinishedLoaded { board } => {
            app.on_finished_loaded(board);
            Some(NetworkRequest::RefreshFinished)
        }
        NetworkResponse::Skipped { request } => {
            app.on_skipped(request);
            None
        }
        NetworkResponse::Error { request, error } => {
            error!("Network error: {error}");
            app.on_error(request, &error);
            Some(request)
        }
    }
}

/// Reads lines until a quit line, EOF or a closed channel. EOF stops manual
/// refresh only; polling carries on.
fn input_handler(input: impl BufRead, ui_events: mpsc::Sender<UiEvent>) {
    for line in input.lines() {
        let Ok(line) = line else {
            break;
        };
        let ui_event = match line.trim() {
            "q" | "quit" => UiEvent::Quit,
            _ => UiEvent::ManualRefresh,
        };
        let quit = ui_event == UiEvent::Quit;
        if ui_events.blocking_send(ui_event).is_err() || quit {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Panel;
    use birdscore_api::client::ApiError;
    use birdscore_api::feed::LiveBoard;
    use std::io::{self, Cursor, Read};
    use std::time::Duration;

    /// Fails the test if anything reads past the quit line.
    struct NoMoreInput;

    impl Read for NoMoreInput {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            panic!("input read after quit");
        }
    }

    fn args(list: &[&str]) -> Result<CliAction, String> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn cli_flags() {
        assert_eq!(args(&[]), Ok(CliAction::Run(RunOptions::default())));
        assert_eq!(
            args(&["--json", "--once"]),
            Ok(CliAction::Run(RunOptions { once: true, format: OutputFormat::Json }))
        );
        assert_eq!(args(&["--once", "-h"]), Ok(CliAction::Help));
        assert_eq!(args(&["-V"]), Ok(CliAction::Version));
        assert_eq!(args(&["--bogus"]), Err("--bogus".to_string()));
    }

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

    #[test]
    fn skipped_response_needs_no_redraw() {
        let mut app = app();
        let redraw = handle_network_response(
            NetworkResponse::Skipped { request: NetworkRequest::RefreshLive },
            &mut app,
        );
        assert_eq!(redraw, None);
    }

    #[test]
    fn error_response_redraws_the_failed_list() {
        let mut app = app();
        handle_network_response(NetworkResponse::LiveLoaded { board: LiveBoard::default() }, &mut app);
        let redraw = handle_network_response(
            NetworkResponse::Error {
                request: NetworkRequest::RefreshLive,
                error: ApiError::Cache("disk full".into()),
            },
            &mut app,
        );
        assert_eq!(redraw, Some(NetworkRequest::RefreshLive));
        assert_eq!(app.live, Panel::Unavailable);
    }

    #[tokio::test]
    async fn manual_refresh_requests_both_lists() {
        let mut app = app();
        let (tx, mut rx) = mpsc::channel(4);
        assert!(handle_ui_event(UiEvent::ManualRefresh, &mut app, &tx).await);
        assert_eq!(rx.recv().await, Some(NetworkRequest::RefreshLive));
        assert_eq!(rx.recv().await, Some(NetworkRequest::RefreshFinished));
        assert!(!handle_ui_event(UiEvent::Quit, &mut app, &tx).await);
    }

    #[test]
    fn quit_line_stops_reading_input() {
        let (tx, mut rx) = mpsc::channel(8);
        let input = io::BufReader::new(Cursor::new("\nq\nignored\n").chain(NoMoreInput));
        input_handler(input, tx);

        assert_eq!(rx.blocking_recv(), Some(UiEvent::ManualRefresh));
        assert_eq!(rx.blocking_recv(), Some(UiEvent::Quit));
        assert_eq!(rx.blocking_recv(), None);
    }

    #[tokio::test]
    async fn quit_event_ends_main_loop_promptly() {
        let (ui_tx, ui_rx) = mpsc::channel(4);
        let (req_tx, _req_rx) = mpsc::channel(4);
        let (_resp_tx, resp_rx) = mpsc::channel(4);
        ui_tx.send(UiEvent::Quit).await.unwrap();

        let finished = tokio::time::timeout(
            Duration::from_secs(1),
            main_loop(app(), OutputFormat::Text, ui_rx, req_tx, resp_rx),
        )
        .await;
        assert!(finished.is_ok(), "main loop kept running after quit");
    }
}
