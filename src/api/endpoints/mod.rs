//! API endpoint handlers.
//!
//! Handlers are thin: they parse the body, hand the work to the shared
//! `Evaluator` on a blocking thread, and serialize the result.

pub mod evaluate;
pub mod health;
