//! Judgement engine for lane-based rhythm games.
//!
//! A [`game::Session`] owns a [`chart::Chart`] and is fed the song time and
//! lane presses once per tick. Each tick first force-misses notes that have
//! scrolled past the miss window, then judges presses against the earliest
//! pending note in their lane.

pub mod chart;
pub mod config;
pub mod game;
pub mod replay;
pub mod traits;
pub mod util;
