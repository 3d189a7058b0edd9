//! # gnetplus-core
//!
//! Core protocol implementation for GNetPlus card readers.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure and encoding/decoding
//! - Checksum calculation
//! - Function code definitions
//! - Protocol constants and dialect configuration

pub mod checksum;
pub mod codec;
pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod frame;

pub use codec::{DecodeResult, FrameCodec};
pub use command::{Function, Reply};
pub use config::{ByteOrder, FrameConfig, LengthField};
pub use error::{Error, FrameError, Result};
pub use frame::Frame;

/// Protocol version information
pub const PROTOCOL_VERSION: &str = "GNetPlus";
