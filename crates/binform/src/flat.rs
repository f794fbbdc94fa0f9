// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Flat-buffer fast path.
//!
//! A structure whose fields are all fixed-width, version-independent and laid
//! out back to back from offset 0 is moved with a single block transfer: one
//! `read_exact` into a scratch buffer on decode, one `write_all` on encode.
//! Individual fields are then decoded from (or encoded into) that buffer with
//! the regular field codecs, so the bytes are identical to the per-field path.

use crate::context::Context;
use crate::error::{FieldContext, Result};
use crate::io::{EndianReader, EndianWriter};
use crate::layout::{FieldKind, ResolvedLayout, StructureLayout};
use crate::walker::FieldAccess;
use std::io::{Cursor, Read, Seek, Write};

/// Block size of `layout` if it qualifies for the flat path.
pub(crate) fn qualifies(layout: &StructureLayout) -> Option<u64> {
    if layout.is_positional()
        || layout.fields().is_empty()
        || layout.version_field().is_some()
        || layout.byte_orders().is_conditional()
        || layout.byte_orders().len() > 1
        || layout.sizes().is_conditional()
        || layout.sizes().len() > 1
    {
        return None;
    }

    let mut spans = Vec::with_capacity(layout.fields().len());
    for field in layout.fields() {
        if !field.is_unconditional() || field.may_be_size_cursor() {
            return None;
        }
        if !matches!(
            field.kind(),
            FieldKind::Primitive(_) | FieldKind::Enum { .. } | FieldKind::Buffer { .. }
        ) {
            return None;
        }
        let (offset, _) = field.offsets().iter().next()?;
        let size = field.effective_fixed_size()? as u64;
        spans.push((*offset, size));
    }

    spans.sort_by_key(|(offset, _)| *offset);
    let mut end = 0u64;
    for (offset, size) in spans {
        if offset != end {
            return None;
        }
        end += size;
    }

    match layout.sizes().iter().next() {
        Some((declared, _)) if *declared != end => None,
        _ => Some(end),
    }
}

fn context(resolved: &ResolvedLayout, index: usize, base: u64) -> FieldContext {
    match resolved.field(index) {
        Some(field) => FieldContext::new(
            &resolved.structure,
            &field.name,
            field.kind.to_string(),
            base + field.offset.unwrap_or(0),
        ),
        None => FieldContext::new(&resolved.structure, "<block>", "flat", base),
    }
}

/// Decode every field of `resolved` from one block of `size` bytes.
pub(crate) fn decode_flat<T: FieldAccess, R: Read + Seek>(
    target: &mut T,
    resolved: &ResolvedLayout,
    size: u64,
    reader: &mut EndianReader<R>,
    ctx: &Context<'_>,
) -> Result<()> {
    let base = reader.absolute_position()?;
    log::trace!("[flat] read {} ({} bytes) @ 0x{:X}", resolved.structure, size, base);

    let block = reader
        .read_bytes(size as usize)
        .map_err(|e| e.in_field(|| FieldContext::new(&resolved.structure, "<block>", "flat", base)))?;
    let mut scratch = EndianReader::with_config(Cursor::new(block), reader.config().clone());

    for field in &resolved.fields {
        scratch.seek_to(field.offset.unwrap_or(0))?;
        target
            .read_field(field.index, &mut scratch, field, ctx)
            .map_err(|e| e.rebased(base).in_field(|| context(resolved, field.index, base)))?;
    }
    Ok(())
}

/// Encode every field of `resolved` into a scratch block, then write it once.
pub(crate) fn encode_flat<T: FieldAccess, W: Write + Seek>(
    source: &T,
    resolved: &ResolvedLayout,
    size: u64,
    writer: &mut EndianWriter<W>,
    ctx: &Context<'_>,
) -> Result<()> {
    let base = writer.absolute_position()?;
    log::trace!("[flat] write {} ({} bytes) @ 0x{:X}", resolved.structure, size, base);

    let mut scratch = EndianWriter::with_config(
        Cursor::new(vec![0u8; size as usize]),
        writer.config().clone(),
    );
    for field in &resolved.fields {
        scratch.seek_to(field.offset.unwrap_or(0))?;
        source
            .write_field(field.index, &mut scratch, field, ctx)
            .map_err(|e| e.rebased(base).in_field(|| context(resolved, field.index, base)))?;
    }

    let block = scratch.into_inner().into_inner();
    writer.write_bytes(&block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::WireType;
    use crate::layout::{CollectionCount, FieldBuilder, LayoutBuilder};
    use crate::order::ByteOrder;
    use crate::version::VersionRange;

    fn header() -> LayoutBuilder {
        LayoutBuilder::new("Header")
            .field(FieldBuilder::of::<u32>("magic").offset(0))
            .field(FieldBuilder::of::<u16>("flags").offset(4))
            .field(FieldBuilder::of::<u8>("kind").offset(6))
    }

    #[test]
    fn test_contiguous_primitives_qualify() {
        let layout = header().build().expect("layout");
        assert_eq!(layout.flat_size(), Some(7));
    }

    #[test]
    fn test_declaration_order_does_not_matter() {
        let layout = LayoutBuilder::new("Swapped")
            .field(FieldBuilder::of::<u8>("kind").offset(6))
            .field(FieldBuilder::of::<u32>("magic").offset(0))
            .field(FieldBuilder::of::<u16>("flags").offset(4))
            .build()
            .expect("layout");
        assert_eq!(layout.flat_size(), Some(7));
    }

    #[test]
    fn test_store_type_counts_wire_width() {
        let layout = LayoutBuilder::new("Stored")
            .field(FieldBuilder::of::<u8>("a").offset(0).store_type(WireType::U32))
            .field(FieldBuilder::of::<u8>("b").offset(4))
            .build()
            .expect("layout");
        assert_eq!(layout.flat_size(), Some(5));
    }

    #[test]
    fn test_gap_disqualifies() {
        let layout = LayoutBuilder::new("Gap")
            .field(FieldBuilder::of::<u32>("a").offset(0))
            .field(FieldBuilder::of::<u32>("b").offset(8))
            .build()
            .expect("layout");
        assert_eq!(layout.flat_size(), None);
    }

    #[test]
    fn test_padding_size_disqualifies() {
        let layout = header().size(16).build().expect("layout");
        assert_eq!(layout.flat_size(), None);
        let exact = header().size(7).build().expect("layout");
        assert_eq!(exact.flat_size(), Some(7));
    }

    #[test]
    fn test_versioned_properties_disqualify() {
        let offset = LayoutBuilder::new("V")
            .field(FieldBuilder::of::<u32>("a").offset_for(0, VersionRange::since(2.0)))
            .build()
            .expect("layout");
        assert_eq!(offset.flat_size(), None);

        let order = header()
            .byte_order_for(ByteOrder::BigEndian, VersionRange::since(20.0))
            .build()
            .expect("layout");
        assert_eq!(order.flat_size(), None);

        let cursor = LayoutBuilder::new("C")
            .field(FieldBuilder::of::<u32>("len").offset(0).size_cursor())
            .build()
            .expect("layout");
        assert_eq!(cursor.flat_size(), None);
    }

    #[test]
    fn test_variable_kinds_disqualify() {
        let string = LayoutBuilder::new("S")
            .field(FieldBuilder::of::<String>("name").offset(0).fixed_length(8))
            .build()
            .expect("layout");
        assert_eq!(string.flat_size(), None);

        let list = LayoutBuilder::new("L")
            .field(
                FieldBuilder::of::<Vec<u16>>("items")
                    .offset(0)
                    .count(CollectionCount::Fixed(4)),
            )
            .build()
            .expect("layout");
        assert_eq!(list.flat_size(), None);
    }
}
