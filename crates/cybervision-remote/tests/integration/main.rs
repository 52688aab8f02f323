//! Integration tests for cybervision-remote
//!
//! Uses wiremock to simulate the holding backend and verifies the HTTP
//! gateway end to end, including the local fallback taken by the
//! reconciliation service when the backend misbehaves.

mod common;

mod test_crud;
mod test_errors;
mod test_fallback;
