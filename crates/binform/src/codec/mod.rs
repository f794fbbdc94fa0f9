// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value codecs: primitives, strings and the per-type field codec.

mod field;
mod guid;
mod half;
mod primitive;
mod string;

pub(crate) use field::{read_collection_count, reverse_packs, write_collection_count};
pub use field::{
    read_bufferable, read_bufferable_array, read_enum, write_bufferable, write_bufferable_array,
    write_enum, Bufferable, FieldCodec,
};
pub use guid::Guid;
pub use half::F16;
pub use primitive::{
    read_primitive, read_scalar, write_primitive, write_scalar, Primitive, Scalar, WireType,
};
pub use string::{read_string, write_string, StringEncoding};
