#![forbid(unsafe_code)]
//! pipetel-sync: drain/quiescence primitives for shared telemetry state.
//!
//! The `Gate` lets many threads mark in-flight regions while a coordinator
//! waits for the regions open *right now* to close. It is deliberately weaker
//! than a mutex: it never excludes regions opened after the wait begins.

pub mod backoff;
pub mod gate;

pub use backoff::SpinBackoff;
pub use gate::{Gate, ScopedEntry, ScopedTraverse};
