//! API middleware.
//!
//! Execution order (outermost → innermost):
//! 1. CORS
//! 2. Audit logger (sees the final status, including timeouts)
//! 3. Timeout
//! 4. Body limit

pub mod audit;
