//! Conversion between canonical types and provider wire formats
//!
//! Each submodule handles one provider protocol. Conversions toward the
//! wire take references; conversions from the wire take ownership of the
//! parsed response.

pub mod anthropic;
pub mod openai;
