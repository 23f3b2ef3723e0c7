//! Pipewatch Core
//!
//! Core types shared by the pipewatch crates.
//!
//! This crate contains:
//! - Domain types: job status, log entries, the job snapshot, pipeline steps
//!   and analysis results
//! - DTOs: wire shapes returned by the job runner API

pub mod domain;
pub mod dto;
