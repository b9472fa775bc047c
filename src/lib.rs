//! # Verification (PIN issuance)
//!
//! `verification` issues one-time verification PIN codes. A caller posts the
//! risk classification and the validity window; the service draws 6 bytes from
//! the operating system CSPRNG, encodes them as an 8 character unpadded base64
//! code, stores the code together with the configured claims, and returns it.
//!
//! ## Components
//!
//! - [`pin`]: the issuance core. Code generation, claims, the store capability
//!   and its `PostgreSQL` implementation.
//! - [`api`]: axum router, handlers and the `OpenAPI` document.
//! - [`cli`]: command line parsing, telemetry and the server action.
//!
//! Redemption of PINs is handled elsewhere; this service only creates them.

pub mod api;
pub mod cli;
pub mod pin;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
