//! Shared test harness
//!
//! Each integration test binary pulls in the whole harness, so helpers that
//! one binary leaves unused are expected.
#![allow(dead_code)]

pub mod config;
pub mod mock_anthropic;
pub mod mock_openai;
