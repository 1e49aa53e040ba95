//! Client for the student profiling API: submit profile data for strengths,
//! challenges, goals, means or a full profile and inspect what comes back.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod errors;
pub mod models;
pub mod payload;
pub mod response;
pub mod runner;

pub use client::ProfileClient;
pub use endpoint::Endpoint;
pub use errors::ClientError;
pub use payload::{Attachment, FieldValue, Payload};
pub use response::Response;
