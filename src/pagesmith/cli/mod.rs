//! # CLI Layer
//!
//! This module is one possible UI client for pagesmith. The editor itself
//! lives in the library and knows nothing about terminals.
//!
//! The CLI layer is the only place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Handles argument parsing
//! - Decides where the workspace directory is
//! - Formats output for human consumption
//!
//! ## Session model
//!
//! Every invocation is one short editing session:
//!
//! 1. Open the workspace: the last manual save is loaded and edit mode is
//!    turned on.
//! 2. If the auto-saved backup is newer than that save (and inside the
//!    recovery window), it is restored, unless `--no-recover` is given.
//!    A newer backup outside the window is reported instead, and commands
//!    that would overwrite it are refused until `recover` restores it or
//!    `--no-recover` discards it.
//! 3. The command runs through a `ContentEditor` operation.
//! 4. Commands that change the document write the auto-save backup, so the
//!    next invocation picks up where this one left off. Only `save` writes
//!    the saved content.
//!
//! Notifications collected by the editor are printed at the end, coloured by
//! level. Start-up notifications are only shown with `--verbose`, except
//! errors.
//!
//! ## Structure
//!
//! - `setup`: clap definitions
//! - `commands`: `run()`, context setup and the `handle_*` functions
//! - `print`: output formatting

mod commands;
mod print;
mod setup;

pub use commands::run;
