//! Match state, turn structure and bookkeeping

pub mod initiative;
pub mod ledger;
pub mod options;
pub mod phase;
pub mod registry;
pub mod report;
pub mod scenario;
pub mod state;
pub mod state_hash;
pub mod turn;

pub use initiative::{generate_turns, roll_initiative};
pub use ledger::{ActionLedger, ActionList, EntityAction, EntityScoped, PhysicalKind, PilotingRoll};
pub use options::GameOptions;
pub use phase::{GamePhase, RoundState};
pub use registry::{EntityRegistry, Occupants};
pub use report::{OutputMode, Report, ReportGuard, ReportLog, VerbosityLevel};
pub use scenario::{ClippedMove, Scenario, ScenarioOutcome};
pub use state::{GameState, Side};
pub use state_hash::{compute_state_hash, format_hash};
pub use turn::{first_eligible, is_eligible_for_phase, next_eligible, GameTurn, TurnSequencer};
