//! Update an npm package across many hosted repositories.
#![expect(
    clippy::pub_use,
    reason = "domain and infrastructure types are re-exported from their parent modules."
)]
#![expect(
    clippy::module_name_repetitions,
    reason = "error and option types are named after the module that owns them."
)]

pub mod commands;
pub mod config;
pub mod domain;
pub mod infrastructure;
