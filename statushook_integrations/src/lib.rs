//! Record backends for statushook.
//!
//! Each backend implements `statushook_core::RecordBackend` and is gated behind
//! a cargo feature of the same name.

#[cfg(feature = "mongo")]
pub mod mongo;
#[cfg(feature = "wekan")]
pub mod wekan;
