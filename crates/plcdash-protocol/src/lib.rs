//! # plcdash-protocol
//!
//! Message formats and endpoints of the remote variable service.
//!
//! This crate defines the JSON bodies exchanged with the service, the
//! request shapes for both URL conventions, and the codec that folds the
//! service's two error conventions into one.

pub mod codec;
pub mod endpoint;
pub mod messages;

pub use codec::*;
pub use endpoint::{HttpRequest, Method};
pub use messages::*;
