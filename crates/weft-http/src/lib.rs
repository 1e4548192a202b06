//! Weft HTTP
//!
//! Thin typed wrapper over `reqwest` for talking to the generation backend:
//! base-URL joining, status checking, JSON decoding and streamed bodies.

mod client;
mod error;

pub use client::{ByteStream, HttpClient, check};
pub use error::HttpError;
