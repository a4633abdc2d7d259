//! blitosc CLI library.
//!
//! Offline rendering, WAV output and analysis on top of `blitosc_engine`.

pub mod analysis;
pub mod args;
pub mod commands;
pub mod render;
pub mod wav;
