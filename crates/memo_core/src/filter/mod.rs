//! Pure view computations over in-memory memo collections.
//!
//! # Responsibility
//! - Search, priority and tag filtering for client-side views.
//! - Deterministic presentation ordering and tag collection.

pub mod memo_filter;
