//! Integration tests
//!
//! Drive the full router with a scripted tool runner and a temporary media
//! library.

mod e2e;
mod fixtures;
