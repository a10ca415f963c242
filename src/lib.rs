//! Forum service library.
//!
//! A minimal forum backend: clients create and list posts, attach threaded
//! comments, and toggle per-IP likes through an HTTP JSON API backed by
//! SQLite.

pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod web;
