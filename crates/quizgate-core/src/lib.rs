//! quizgate-core — Assessment session logic.
//!
//! Question selection, scoring, retake reconstruction and result
//! reconciliation for quizzes that report to a host learning record. The
//! host itself is reached through the traits in [`traits`].

pub mod codec;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod pool;
pub mod reconcile;
pub mod report;
pub mod scoring;
pub mod session;
pub mod traits;
