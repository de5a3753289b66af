//! QUORUM Insight - Causal Analysis and Emergent Behavior
//!
//! Explains observed events as causal chains and mines the coordination log
//! for recurring multi-agent patterns.
//!
//! # Key Types
//!
//! - [`CausalAnalyzer`] - derives a cause-to-root-cause chain for an event,
//!   with one recommendation per level and preventive measures from the root
//! - [`AnalysisContext`] - caller observations and hypotheses that extend an
//!   analysis
//! - [`CoordinationLog`] - append-only, thread-safe log of coordination
//!   events, with emergent-behavior detection over participant patterns

mod causal;
mod coordination;

pub use causal::{AnalysisContext, CausalAnalyzer, Hypothesis};
pub use coordination::CoordinationLog;
