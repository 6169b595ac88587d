//! Player-facing round and phase reports
//!
//! Reports go into a buffer for the phase in progress. Ending the phase
//! commits the buffer into the history for its round. Depending on the
//! output mode, reports are also echoed to stdout as they arrive.

use crate::core::EntityId;
use crate::game::GamePhase;
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::ops::Deref;

/// How much of the match to narrate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum VerbosityLevel {
    /// Nothing at all
    Silent = 0,
    /// Round headers and eliminations
    Minimal = 1,
    /// Moves, attacks and phase changes (default)
    #[default]
    Normal = 2,
    /// Every step and roll
    Verbose = 3,
}

/// Where reports go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    #[default]
    Stdout,
    /// Captured in memory only
    Memory,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub round: u32,
    pub phase: GamePhase,
    pub level: VerbosityLevel,
    /// Unit the report is about, if any
    pub entity: Option<EntityId>,
    pub message: String,
}

/// Read-only view of the current phase's reports
pub struct ReportGuard<'a> {
    guard: Ref<'a, Vec<Report>>,
}

impl ReportGuard<'_> {
    pub fn iter(&self) -> std::slice::Iter<'_, Report> {
        self.guard.iter()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }
}

impl Deref for ReportGuard<'_> {
    type Target = [Report];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Round and phase report log
///
/// Logging takes `&self` so reports can be written from read-only queries.
pub struct ReportLog {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,
    round: u32,
    phase: GamePhase,
    current: RefCell<Vec<Report>>,
    history: BTreeMap<u32, Vec<Report>>,
}

impl ReportLog {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        ReportLog {
            verbosity,
            output_mode: OutputMode::default(),
            round: 0,
            phase: GamePhase::Lounge,
            current: RefCell::new(Vec::new()),
            history: BTreeMap::new(),
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    /// Commit the current buffer and start collecting for a new phase
    pub fn begin_phase(&mut self, round: u32, phase: GamePhase) {
        self.commit_phase();
        self.round = round;
        self.phase = phase;
    }

    /// Move the current buffer into the round history
    pub fn commit_phase(&mut self) {
        let reports = std::mem::take(self.current.get_mut());
        if !reports.is_empty() {
            self.history.entry(self.round).or_default().extend(reports);
        }
    }

    /// Reports of the phase in progress
    pub fn current(&self) -> ReportGuard<'_> {
        ReportGuard {
            guard: self.current.borrow(),
        }
    }

    /// Committed reports of a round
    pub fn round_reports(&self, round: u32) -> &[Report] {
        self.history.get(&round).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn history(&self) -> &BTreeMap<u32, Vec<Report>> {
        &self.history
    }

    /// Every report, committed ones first
    pub fn all_messages(&self) -> Vec<String> {
        let current = self.current.borrow();
        self.history
            .values()
            .flatten()
            .chain(current.iter())
            .map(|r| r.message.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.current.get_mut().clear();
        self.history.clear();
    }

    fn print(&self, level: VerbosityLevel, message: &str) {
        if level == VerbosityLevel::Minimal {
            println!("{message}");
        } else {
            println!("  {message}");
        }
    }

    /// Record a report at `level`
    pub fn add(&self, level: VerbosityLevel, entity: Option<EntityId>, message: &str) {
        if level == VerbosityLevel::Silent {
            return;
        }
        let capture = self.is_capturing();
        let echo = matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both)
            && level <= self.verbosity;

        if capture {
            self.current.borrow_mut().push(Report {
                round: self.round,
                phase: self.phase,
                level,
                entity,
                message: message.to_string(),
            });
        }
        if echo {
            self.print(level, message);
        }
    }

    pub fn minimal(&self, message: &str) {
        self.add(VerbosityLevel::Minimal, None, message);
    }

    pub fn normal(&self, message: &str) {
        self.add(VerbosityLevel::Normal, None, message);
    }

    pub fn verbose(&self, message: &str) {
        self.add(VerbosityLevel::Verbose, None, message);
    }

    /// Normal-level report about one unit
    pub fn about(&self, entity: EntityId, message: &str) {
        self.add(VerbosityLevel::Normal, Some(entity), message);
    }
}

impl Default for ReportLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReportLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportLog")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("round", &self.round)
            .field("phase", &self.phase)
            .field("pending", &self.current.borrow().len())
            .finish()
    }
}

impl Clone for ReportLog {
    fn clone(&self) -> Self {
        ReportLog {
            verbosity: self.verbosity,
            output_mode: self.output_mode,
            round: self.round,
            phase: self.phase,
            current: RefCell::new(self.current.borrow().clone()),
            history: self.history.clone(),
        }
    }
}

impl Serialize for ReportLog {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ReportLog", 5)?;
        state.serialize_field("verbosity", &self.verbosity)?;
        state.serialize_field("output_mode", &self.output_mode)?;
        state.serialize_field("round", &self.round)?;
        state.serialize_field("phase", &self.phase)?;
        state.serialize_field("history", &self.history)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ReportLog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ReportLogData {
            verbosity: VerbosityLevel,
            output_mode: OutputMode,
            round: u32,
            phase: GamePhase,
            #[serde(default)]
            history: BTreeMap<u32, Vec<Report>>,
        }

        let data = ReportLogData::deserialize(deserializer)?;
        Ok(ReportLog {
            verbosity: data.verbosity,
            output_mode: data.output_mode,
            round: data.round,
            phase: data.phase,
            current: RefCell::new(Vec::new()),
            history: data.history,
        })
    }
}
