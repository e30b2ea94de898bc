//! Evaluation orchestration for agent outputs scored by a remote service.
//!
//! Single-item path: [`roster::Roster`] → [`dispatcher::Dispatcher`] →
//! [`aggregate`]. Batch path: CSV file → [`batch::BatchPipeline`] →
//! [`aggregate`]. [`session::Session`] holds the operator-visible state
//! between cycles.

pub mod aggregate;
pub mod batch;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod metadata;
pub mod models;
pub mod output;
pub mod roster;
pub mod session;
