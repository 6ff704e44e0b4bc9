//! # quadrpc binaries
//!
//! Pieces shared by `quadrpc-server` and `quadrpc-client`:
//!
//! * [`cli`]: `clap` argument definitions, readable from the environment and `.env`.
//! * [`config`]: validated runtime configuration built from the parsed arguments.
//! * [`menu`]: the interactive client's menu choices.
//! * [`formatter`]: console rendering of responses and errors.
//! * [`telemetry`]: `tracing` subscriber setup.
pub mod cli;
pub mod config;
pub mod formatter;
pub mod menu;
pub mod telemetry;
