//! Eviction policy implementations (replacers).
//!
//! Currently implements:
//! - [`ClockReplacer`] - CLOCK (second chance)

mod clock;

pub use clock::ClockReplacer;
