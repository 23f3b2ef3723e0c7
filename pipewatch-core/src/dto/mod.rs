//! Data Transfer Objects for the job runner API
//!
//! Response bodies of the runner's status, log and result endpoints. The
//! run and reset endpoints return no body the dashboard relies on.

pub mod job;
