//! campusdesk: a campus maintenance complaint desk.
//!
//! Students file complaints, admins assign them to technicians under a
//! caseload cap, and technicians move them through
//! open → in progress → resolved against per-priority SLA deadlines.
//!
//! The crate is both a library and the `campusdesk` CLI. Desk operations in
//! [`desk`] run against any [`storage::DeskStorage`] backend and take the
//! acting [`domain::Session`] explicitly.

#![forbid(unsafe_code)]

pub mod analytics;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod desk;
pub mod domain;
pub mod effects;
pub mod error;
pub mod export;
pub mod id_generation;
pub mod output;
pub mod policy;
pub mod storage;
