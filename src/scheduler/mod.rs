//! Adaptive match discovery
//!
//! Polls match history for every tracked duo, filters shared matches and
//! hands accepted ones to the scoring pipeline exactly once.

pub mod discovery;
pub mod interval;
pub mod poller;

pub use discovery::{CandidateRejection, DiscoveryFilter};
pub use interval::PollIntervalPolicy;
pub use poller::{CycleReport, MatchScheduler, SchedulerSettings};
