//! Application layer orchestrating the domain.
//!
//! [`event_store::EventStore`] owns the retention policy over a pluggable
//! backend; [`service::QrisService`] is the entry point the outer shell calls.

pub mod event_store;
pub mod service;
