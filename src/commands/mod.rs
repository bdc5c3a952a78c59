//! Command orchestration.

pub mod app;
pub mod gather;
pub mod publish;
pub mod update;
