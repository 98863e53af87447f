pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod ranking;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod stability;
pub mod trace;
pub mod types;

pub use analysis::{Analysis, AnalysisSummary, PassSummary};
pub use config::AnalysisConfig;
pub use engine::AttackWindowEngine;
pub use error::{AnalysisError, Result};
pub use registry::{Candidate, CandidateRegistry};
pub use scheduler::{ObfuscationOutcome, ObfuscationScheduler};
pub use types::{Instance, SlotState, TraceRecord, WindowEntry};
