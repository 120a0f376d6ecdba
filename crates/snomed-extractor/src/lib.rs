//! SNOMED Extractor - Clinical entity extraction client
//!
//! Delegates entity recognition, SNOMED CT coding and confidence scoring to
//! the Gemini `generateContent` API:
//! - Request construction: instruction prompt plus response schema
//! - Transport: one POST per narrative through an injectable [`Transport`]
//! - Decoding: response envelope, then the nested JSON entity array
//!
//! [`Transport`]: snomed_core::Transport

pub mod filter;
pub mod gemini;
pub mod request;
pub mod response;
pub mod transport;
pub mod wire;

pub use filter::filter_coded_unique;
pub use gemini::GeminiExtractor;
pub use request::{build_prompt, build_request, response_schema};
pub use response::parse_response;
pub use transport::HttpTransport;
