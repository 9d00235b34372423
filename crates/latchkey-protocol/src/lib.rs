//! Badge reader wire protocol.
//!
//! The reader emits credentials as `LF <code> CR` runs on an otherwise
//! unframed serial line. [`FrameDecoder`] turns that byte stream back into
//! [`CredentialCode`](latchkey_core::CredentialCode)s.

pub mod frame_decoder;

pub use frame_decoder::{DecoderStats, FrameDecoder};
