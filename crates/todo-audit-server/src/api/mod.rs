//! HTTP API envelopes shared by every route group

pub mod response;

pub use response::{ApiResponse, ErrorDetail, ErrorResponse};
