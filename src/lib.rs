//! Asynchronous image classification jobs
//!
//! Uploaded images become jobs that a background processor normalizes,
//! sends to a remote inference endpoint and resolves to a class label.
//! Callers poll the job by id until it reaches `done` or `error`.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
