//! # gomoku-peer — terminal front end
//!
//! Drives a [`gomoku_core::Session`] from a ratatui interface: pick host
//! or guest in the menu, play on a cursor-driven board, then rematch or
//! go back to the menu.

pub mod app;
pub mod config;
