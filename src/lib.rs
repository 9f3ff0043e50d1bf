//! Importgate - Distributed Import Rate Limiting
//!
//! This crate rate limits wallet transaction imports across a fleet of web
//! processes. Each import is evaluated over a sliding time window against
//! three dimensions (the user, the client address, and the target wallet)
//! with all state held in a shared Redis-style store, so the limits hold
//! no matter which process serves a request. When the store cannot be
//! reached, checks fail closed.

pub mod ratelimit;
pub mod store;
pub mod config;
pub mod error;
