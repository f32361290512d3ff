//! Middleware components for HTTP request processing

pub mod access;
pub mod correlation;

pub use access::{CurrentSession, ORIGINAL_URL_HEADER, OriginalUrl, access_gate_middleware};
pub use correlation::{
    CORRELATION_ID_HEADER, CorrelationId, correlation_id_middleware, extract_correlation_id,
};
