//! Event-driven triggers for the downstream Glue stages: routes, token auth,
//! the Glue-backed orchestrator, and OpenAPI documentation.

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod glue;
pub mod openapi;
pub mod routes;
pub mod state;
