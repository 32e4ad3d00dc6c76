// File: core/mod.rs
// Shared building blocks: errors, client config, JSON, the dispatcher and `catch`.

pub mod catch;
pub mod error;
pub mod http;
pub mod json;
pub mod request_impl;

