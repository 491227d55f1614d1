//! Only included in test

use std::sync::Arc;

use write_fonts::{types::Tag, FontBuilder};

/// The smallest thing that parses as a font.
pub(crate) fn minimal_font() -> Arc<[u8]> {
    FontBuilder::new()
        .add_raw(Tag::new(b"TEST"), vec![1u8, 2, 3, 4])
        .build()
        .into()
}

pub(crate) fn garbage() -> Arc<[u8]> {
    b"definitely not a font".to_vec().into()
}

/// A collection whose `count` members all share [`minimal_font`]'s tables.
pub(crate) fn minimal_collection(count: u32) -> Arc<[u8]> {
    let font = minimal_font();
    let header_len = 12 + 4 * count;

    let mut data = Vec::new();
    data.extend_from_slice(b"ttcf");
    data.extend_from_slice(&1u16.to_be_bytes());
    data.extend_from_slice(&0u16.to_be_bytes());
    data.extend_from_slice(&count.to_be_bytes());
    for _ in 0..count {
        data.extend_from_slice(&header_len.to_be_bytes());
    }

    // table offsets are relative to the start of the file
    let mut font = font.to_vec();
    let num_tables = u16::from_be_bytes([font[4], font[5]]) as usize;
    for i in 0..num_tables {
        let pos = 12 + 16 * i + 8;
        let offset = u32::from_be_bytes(font[pos..pos + 4].try_into().unwrap());
        font[pos..pos + 4].copy_from_slice(&(offset + header_len).to_be_bytes());
    }
    data.extend(font);
    data.into()
}
