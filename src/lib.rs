//! Task board library
//!
//! Task cards linked by directed connections: the graph store, the
//! controllers that turn gestures into store mutations, and the persistence
//! that keeps a snapshot on disk in step with every change.

pub mod board;
pub mod cli;
pub mod config;
pub mod controller;
pub mod diff;
pub mod dialog;
pub mod error;
pub mod events;
pub mod format;
pub mod geometry;
pub mod logging;
pub mod persist;
pub mod render;
pub mod store;
pub mod types;
