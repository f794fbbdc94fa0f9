// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Seekable byte-order aware streams.
//!
//! [`EndianReader`] and [`EndianWriter`] carry the stream default byte order
//! (last step of the field -> structure -> stream chain), the codec limits of
//! a [`CodecConfig`](crate::config::CodecConfig) and a virtual origin used by
//! nested readers/writers. [`TransactionStream`] turns a read-only source
//! into a writable stream whose changes stay pending until committed.

mod reader;
mod transaction;
mod writer;

pub use reader::EndianReader;
pub use transaction::TransactionStream;
pub use writer::EndianWriter;
