//! Best-correlated pair search over a directory of time series, built on a
//! small `submit` → [`executor::Future`] worker pool.

pub mod analysis;
pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod executor;
pub mod report;
pub mod state;
pub mod ui;
