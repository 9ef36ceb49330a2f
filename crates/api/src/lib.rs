//! HTTP API: server wiring, routing, the access gate and error mapping.

pub mod app;
pub mod middleware;
