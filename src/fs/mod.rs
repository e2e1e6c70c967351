//! Filesystem utilities for repolock.
//!
//! The local backend stores every object through an atomic write so that a
//! concurrent lister never observes a half-written lock record.

pub mod atomic;

pub use atomic::atomic_write;
