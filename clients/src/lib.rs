//! NumLPA command-line client.
//!
//! The `numlpa` binary is a thin [`clap`] front end over the subcommands in
//! [`commands`]; [`config`] and [`logging`] hold what they share.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod commands;
pub mod config;
pub mod logging;
