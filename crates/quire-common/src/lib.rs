//! Common utilities for the Quire styling engine.
//!
//! This crate provides shared infrastructure used by all engine components:
//! - **Warning System** - colored terminal output for lenient parse decisions
//! - **Text helpers** - quote- and bracket-aware whitespace splitting
//! - **Fetching** - blocking HTTP / `data:` URL fetch and an on-disk image cache

pub mod cache;
pub mod net;
pub mod text;
pub mod warning;
