use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use chrono::Local;
use rayon::prelude::*;
use reqwest::blocking::Client;

use crate::config::{FeedConfig, Preset};
use crate::documents::{
    DistanceResults, build_results_by_distance, build_start_list, build_teams_document,
};
use crate::http_client::http_client;
use crate::leaderboard::FieldSet;
use crate::podium::parse_podium_html;
use crate::provider::{self, ProviderModule};
use crate::publish::{write_json, write_json_with_history};
use crate::state::{Delta, ProviderCommand};

const CANCEL_TICK: Duration = Duration::from_millis(200);

/// Cooperative stop flag shared between the poller and whoever owns it.
/// The loop looks at it between cycles only.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceStatus {
    pub distance: String,
    pub participants: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub finished_at: String,
    pub distances: Vec<DistanceStatus>,
    pub records: usize,
    pub written: Vec<PathBuf>,
}

impl CycleReport {
    pub fn participants(&self) -> usize {
        self.distances.iter().map(|d| d.participants).sum()
    }
}

pub fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}

/// Fetch every configured distance in parallel. Results come back in the
/// configured order once all workers are done; a failed distance is empty.
pub fn fetch_all(
    client: &Client,
    config: &FeedConfig,
    module: ProviderModule,
    pool: &Option<rayon::ThreadPool>,
) -> Vec<(DistanceResults, Option<String>)> {
    with_fetch_pool(pool, || {
        config
            .distances
            .par_iter()
            .map(|distance| {
                match provider::fetch_distance(client, config, module, distance) {
                    Ok(participants) => (
                        DistanceResults {
                            distance: distance.clone(),
                            participants,
                        },
                        None,
                    ),
                    Err(err) => {
                        log::warn!("fetch failed for distance {distance}: {err:#}");
                        (
                            DistanceResults {
                                distance: distance.clone(),
                                participants: Vec::new(),
                            },
                            Some(format!("{err:#}")),
                        )
                    }
                }
            })
            .collect()
    })
}

fn split_fetched(
    fetched: Vec<(DistanceResults, Option<String>)>,
) -> (Vec<DistanceResults>, Vec<DistanceStatus>) {
    let mut data = Vec::with_capacity(fetched.len());
    let mut statuses = Vec::with_capacity(fetched.len());
    for (results, error) in fetched {
        if results.participants.is_empty() && error.is_none() {
            log::warn!("no participants for distance {}", results.distance);
        }
        statuses.push(DistanceStatus {
            distance: results.distance.clone(),
            participants: results.participants.len(),
            error,
        });
        data.push(results);
    }
    (data, statuses)
}

fn ensure_ready(config: &FeedConfig) -> Result<()> {
    let missing = config.missing_requirements();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("missing configuration: {}", missing.join(", ")))
    }
}

/// One fetch, aggregate and write pass over all distances.
pub fn run_summary_cycle(
    config: &FeedConfig,
    preset: &Preset,
    pool: &Option<rayon::ThreadPool>,
) -> Result<CycleReport> {
    ensure_ready(config)?;
    let client = http_client()?;
    let fetched = fetch_all(client, config, ProviderModule::Results, pool);
    let (data, distances) = split_fetched(fetched);

    let mut written = Vec::new();
    let mut records = 0usize;
    if data.iter().all(|d| d.participants.is_empty()) {
        log::warn!("no data to process");
    } else {
        let results = build_results_by_distance(&data);
        written.push(write_json_with_history(
            &config.output_dir,
            "summary_results",
            &results,
            config.keep_history,
        )?);

        let teams = build_teams_document(&data, preset, FieldSet::results());
        records = teams.teams.len();
        written.push(write_json(&config.output_dir, "leaderboards.json", &teams)?);
        log::info!("summary cycle wrote {records} leaderboard records");
    }

    Ok(CycleReport {
        finished_at: Local::now().format("%H:%M:%S").to_string(),
        distances,
        records,
        written,
    })
}

pub fn run_start_list(
    config: &FeedConfig,
    pool: &Option<rayon::ThreadPool>,
) -> Result<CycleReport> {
    ensure_ready(config)?;
    let client = http_client()?;
    let fetched = fetch_all(client, config, ProviderModule::StartList, pool);
    let (data, distances) = split_fetched(fetched);

    let everyone: Vec<_> = data.into_iter().flat_map(|d| d.participants).collect();
    let mut written = Vec::new();
    let mut records = 0usize;
    if everyone.is_empty() {
        log::warn!("start list is empty");
    } else {
        let docs = build_start_list(&everyone);
        records = docs.by_club.len() + docs.by_category.len();
        written.push(write_json(&config.output_dir, "teams_startlist.json", &docs.by_club)?);
        written.push(write_json(
            &config.output_dir,
            "subteams_startlist.json",
            &docs.by_category,
        )?);
    }

    Ok(CycleReport {
        finished_at: Local::now().format("%H:%M:%S").to_string(),
        distances,
        records,
        written,
    })
}

pub fn run_awarding(config: &FeedConfig, preset: &Preset) -> Result<CycleReport> {
    let client = http_client()?;
    let html = provider::fetch_podium_html(client, config)?;
    let podiums = parse_podium_html(&html, preset);
    if podiums.is_empty() {
        log::warn!("podium page had no usable tables");
    }
    let path = write_json(&config.output_dir, "awarding_results.json", &podiums)?;
    Ok(CycleReport {
        finished_at: Local::now().format("%H:%M:%S").to_string(),
        distances: Vec::new(),
        records: podiums.len(),
        written: vec![path],
    })
}

/// Repeat summary cycles until `token` is cancelled. A cycle that has started
/// always runs to completion; the token is checked before each one and while
/// waiting out the interval.
pub fn run_polling(
    config: &FeedConfig,
    preset: &Preset,
    token: &CancelToken,
    mut on_cycle: impl FnMut(Result<CycleReport>),
) {
    let pool = build_fetch_pool(config.fetch_parallelism);
    while !token.is_cancelled() {
        let report = run_summary_cycle(config, preset, &pool);
        if let Err(err) = &report {
            log::warn!("summary cycle failed: {err:#}");
        }
        on_cycle(report);
        sleep_unless_cancelled(config.poll_interval, token);
    }
}

fn sleep_unless_cancelled(total: Duration, token: &CancelToken) {
    let deadline = Instant::now() + total;
    while !token.is_cancelled() {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep((deadline - now).min(CANCEL_TICK));
    }
}

struct Poller {
    token: CancelToken,
    handle: JoinHandle<()>,
}

impl Poller {
    fn stop(self) {
        self.token.cancel();
        let _ = self.handle.join();
    }
}

/// Background worker for the monitor: executes commands and reports back.
pub fn spawn_provider(
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
    config: FeedConfig,
    preset: Preset,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let config = Arc::new(config);
        let mut preset = Arc::new(preset);
        let pool = build_fetch_pool(config.fetch_parallelism);
        let mut poller: Option<Poller> = None;

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::StartPolling => {
                    if poller.as_ref().is_some_and(|p| !p.handle.is_finished()) {
                        let _ = tx.send(Delta::Log(
                            "[INFO] Summary updates already running".into(),
                        ));
                        continue;
                    }
                    poller = Some(start_poller(tx.clone(), config.clone(), preset.clone()));
                    let _ = tx.send(Delta::PollingStarted);
                }
                ProviderCommand::StopPolling => {
                    let Some(running) = poller.take() else {
                        let _ = tx.send(Delta::PollingStopped);
                        continue;
                    };
                    let _ = tx.send(Delta::Log(
                        "[INFO] Stop requested, finishing current cycle".into(),
                    ));
                    running.stop();
                    let _ = tx.send(Delta::PollingStopped);
                }
                ProviderCommand::FetchStartList => match run_start_list(&config, &pool) {
                    Ok(report) => {
                        let _ = tx.send(Delta::StartListWritten(report));
                    }
                    Err(err) => {
                        let _ = tx.send(Delta::Log(format!("[WARN] Start list failed: {err:#}")));
                    }
                },
                ProviderCommand::FetchAwarding => match run_awarding(&config, &preset) {
                    Ok(report) => {
                        let _ = tx.send(Delta::AwardingWritten(report));
                    }
                    Err(err) => {
                        let _ = tx.send(Delta::Log(format!("[WARN] Awarding failed: {err:#}")));
                    }
                },
                ProviderCommand::ReloadPreset => match config.load_preset() {
                    Ok(loaded) => {
                        preset = Arc::new(loaded);
                        let _ = tx.send(Delta::Log(format!(
                            "[INFO] Preset reloaded ({} group names); applies from next start",
                            preset.groups.len()
                        )));
                    }
                    Err(err) => {
                        let _ = tx.send(Delta::Log(format!(
                            "[WARN] Preset reload failed: {err:#}"
                        )));
                    }
                },
                ProviderCommand::Shutdown => break,
            }
        }

        if let Some(running) = poller.take() {
            running.stop();
        }
    })
}

fn start_poller(tx: Sender<Delta>, config: Arc<FeedConfig>, preset: Arc<Preset>) -> Poller {
    let token = CancelToken::new();
    let worker_token = token.clone();
    let handle = thread::spawn(move || {
        run_polling(&config, &preset, &worker_token, |report| {
            let delta = match report {
                Ok(report) => Delta::CycleFinished(report),
                Err(err) => Delta::Log(format!("[WARN] Summary cycle failed: {err:#}")),
            };
            let _ = tx.send(delta);
        });
    });
    Poller { token, handle }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{CancelToken, sleep_unless_cancelled};

    #[test]
    fn token_clones_share_state() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn cancelled_token_skips_the_wait() {
        let token = CancelToken::new();
        token.cancel();
        let started = Instant::now();
        sleep_unless_cancelled(Duration::from_secs(30), &token);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
