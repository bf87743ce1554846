//! places-cli
//! ==========
//!
//! Command-line interface for the `places-core` place search engine.
//!
//! This crate primarily provides a binary (`places`). The library target
//! only carries this overview page.
//!
//! Quick start
//! -----------
//!
//! ```text
//! places --help
//! places search lond
//! places search --countries fr --json marseile
//! places --data-dir ./db stats
//! places distance 51.5,-0.12 48.85,2.35
//! ```
//!
//! For programmatic access use the [`places-core`] crate directly.
#![cfg_attr(docsrs, feature(doc_cfg))]
