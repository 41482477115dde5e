//! Integration testing module
//!
//! Scenario tests for the engine driven by a scripted tool runner:
//! - Playlist generation from a probed file
//! - Segment transcoding with track selection
//! - Scratch alias cleanup
