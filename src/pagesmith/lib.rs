//! # Pagesmith Architecture
//!
//! Pagesmith is a **UI-agnostic block editor library**: a document is an
//! ordered list of typed content blocks (text, heading, image, video, audio,
//! quote) that can be selected, duplicated, reordered, saved with auto-save
//! recovery, and exported to HTML, JSON, Markdown or a print view. The
//! `pagesmith` binary is one client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, prints notifications, exit codes       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Controller (editor.rs)                                     │
//! │  - Owns all editor state, one notification per operation    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Core (document, selection, render, export, persist)        │
//! │  - Pure logic on Rust types, returns Result                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/)                                           │
//! │  - KeyValueStore trait: FsStore, MemoryStore, FallbackStore │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! From `editor.rs` inward nothing writes to stdout/stderr or exits the
//! process. Time that drives behaviour (auto-save, recovery, export stamps)
//! is always a parameter.
//!
//! ## Testing Strategy
//!
//! Core modules carry their own unit tests against `MemoryStore`. The
//! controller is tested through `MessageLog`, which records every
//! notification. End-to-end CLI behaviour lives in `tests/`.
//!
//! ## Module Overview
//!
//! - [`model`]: block kinds, attributes, `Block`, `Document`, preferences
//! - [`render`]: form input to validated blocks, sanitized block markup
//! - [`media`]: URL classification for video and audio blocks
//! - [`document`]: the ordered block list and its structural edits
//! - [`selection`]: selected positions and batch operations
//! - [`store`]: key-value storage backends
//! - [`persist`]: snapshots, recovery and preferences on top of a store
//! - [`autosave`]: the auto-save interval
//! - [`upload`]: background file reads for media uploads
//! - [`export`]: HTML, JSON, Markdown and print exports
//! - [`editor`]: the controller tying everything together
//! - [`notify`]: the notification sink
//! - [`config`]: workspace configuration
//! - [`error`]: error types

pub mod autosave;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod export;
pub mod media;
pub mod model;
pub mod notify;
pub mod persist;
pub mod render;
pub mod selection;
pub mod store;
pub mod upload;
