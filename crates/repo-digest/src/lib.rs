//! repo-digest library
//!
//! This module exports the core functionality of repo-digest for use in
//! integration tests and by the binary.

mod migrations;

pub mod config;
pub mod db;
pub mod handlers;
pub mod poller;
pub mod queries;
pub mod server;
