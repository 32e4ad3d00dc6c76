// File: net/mod.rs
// Verb helpers and reachability probes built on `core`.

pub mod probes;
pub mod verbs;
