//! Core domain types
//!
//! These types describe the remote document-processing job as the dashboard
//! sees it. They are built from the job runner's responses and shared between
//! the sync controller (which owns the snapshot) and its consumers.

pub mod job;
pub mod log;
pub mod pipeline;
pub mod result;
