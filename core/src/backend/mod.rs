//! Document Service Backend
//!
//! Abstraction over the remote document-intelligence service. The
//! `DocumentBackend` trait lets the Coordinator work against the real HTTP
//! service or a scripted test double without changing core logic.
//!
//! # Modules
//!
//! - `traits`: The `DocumentBackend` trait, wire types, and error taxonomy
//! - `decode`: Incremental UTF-8 decoding for chunked answer streams
//! - `http`: The production `reqwest` implementation

pub mod decode;
pub mod http;
pub mod traits;

pub use decode::{DecodeError, Utf8Decoder};
pub use http::HttpBackend;
pub use traits::{
    BackendError, DocumentBackend, DocumentInfo, StreamingToken, UploadAccepted,
};
