use std::collections::VecDeque;

use crate::feed::CycleReport;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    Stopped,
    Running,
    Stopping,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub stage: String,
    pub distances: Vec<String>,
    pub poll_status: PollStatus,
    pub cycles: u64,
    pub last_cycle: Option<CycleReport>,
    pub last_start_list: Option<CycleReport>,
    pub last_awarding: Option<CycleReport>,
    pub selected: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl AppState {
    pub fn new(stage: impl Into<String>, distances: Vec<String>) -> Self {
        Self {
            stage: stage.into(),
            distances,
            poll_status: PollStatus::Stopped,
            cycles: 0,
            last_cycle: None,
            last_start_list: None,
            last_awarding: None,
            selected: 0,
            logs: VecDeque::new(),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn select_next(&mut self) {
        let total = self.distances.len();
        if total > 0 {
            self.selected = (self.selected + 1).min(total - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Participants the last summary cycle saw for `distance`, if it ran.
    pub fn participants_for(&self, distance: &str) -> Option<usize> {
        self.last_cycle
            .as_ref()?
            .distances
            .iter()
            .find(|d| d.distance == distance)
            .map(|d| d.participants)
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    Log(String),
    PollingStarted,
    PollingStopped,
    CycleFinished(CycleReport),
    StartListWritten(CycleReport),
    AwardingWritten(CycleReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    StartPolling,
    StopPolling,
    FetchStartList,
    FetchAwarding,
    ReloadPreset,
    Shutdown,
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Log(line) => state.push_log(line),
        Delta::PollingStarted => {
            state.poll_status = PollStatus::Running;
            state.push_log("[INFO] Summary updates started");
        }
        Delta::PollingStopped => {
            state.poll_status = PollStatus::Stopped;
            state.push_log("[INFO] Summary updates stopped");
        }
        Delta::CycleFinished(report) => {
            state.cycles += 1;
            for d in &report.distances {
                if let Some(err) = &d.error {
                    state.push_log(format!("[WARN] {}: {err}", d.distance));
                } else if d.participants == 0 {
                    state.push_log(format!("[WARN] {}: no participants", d.distance));
                }
            }
            state.push_log(format!(
                "[INFO] Cycle {} at {}: {} participants, {} records",
                state.cycles,
                report.finished_at,
                report.participants(),
                report.records
            ));
            state.last_cycle = Some(report);
        }
        Delta::StartListWritten(report) => {
            state.push_log(format!(
                "[INFO] Start list: {} participants, {} files",
                report.participants(),
                report.written.len()
            ));
            state.last_start_list = Some(report);
        }
        Delta::AwardingWritten(report) => {
            state.push_log(format!("[INFO] Awarding: {} podium records", report.records));
            state.last_awarding = Some(report);
        }
    }
}
