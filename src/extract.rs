//! Payload extraction: block window read, archive layer, keystream, codec.

use std::io::{self, Read, Seek, SeekFrom};

use crate::block::{BlockWindow, FileRecord, BLOCK_SIZE};
use crate::codec::{get_codec, CodecId};
use crate::crypto::{decrypt_archive_blocks, CipherKey, FileKey};
use crate::error::{BbfsError, Result};
use crate::index::ResolvedEntry;
use crate::profile::FormatProfile;

/// Read the blocks of `window` and remove the archive layer from each.
///
/// Blocks past end of file are not required; the returned buffer stops at
/// whatever the reader could supply.
pub fn read_window<R: Read + Seek>(
    reader: &mut R,
    window: &BlockWindow,
    key:    &CipherKey,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.seek(SeekFrom::Start(window.start()))?;
    reader.by_ref().take(window.len() as u64).read_to_end(&mut buf)?;
    decrypt_archive_blocks(&mut buf, key, window.block_count);
    Ok(buf)
}

/// Apply the file keystream block segment by block segment: the first
/// segment ends at the block boundary after `first_block_offset`, later
/// ones are whole blocks. The cipher state carries across segments.
pub fn apply_keystream_segmented(key: &mut FileKey, payload: &mut [u8], first_block_offset: usize) {
    let head = (BLOCK_SIZE - first_block_offset % BLOCK_SIZE).min(payload.len());
    let (first, rest) = payload.split_at_mut(head);
    key.apply_keystream(first);
    for segment in rest.chunks_mut(BLOCK_SIZE) {
        key.apply_keystream(segment);
    }
}

/// Extract the entry resolved at `entry.entry_offset` of `toc`, reading the
/// payload from `reader` (the raw container).
pub fn extract_entry<R: Read + Seek>(
    reader:  &mut R,
    toc:     &[u8],
    entry:   &ResolvedEntry,
    profile: &FormatProfile,
) -> Result<(FileRecord, Vec<u8>)> {
    let mut key = FileKey::new(&entry.name);
    let record_bytes = toc.get(entry.entry_offset..).ok_or_else(|| {
        BbfsError::CorruptToc(format!("entry offset 0x{:X} outside the TOC", entry.entry_offset))
    })?;
    let record = FileRecord::read(record_bytes, &key.mask())?;
    let compressed = record.is_compressed(profile.compressed_flag);

    let window = record.window();
    let first = window.first_block_offset;
    let declared = if compressed { record.compressed_size } else { record.uncompressed_size };
    let needed = (first + declared as usize).min(window.len());

    tracing::trace!(
        name = %entry.name,
        offset = record.file_offset,
        blocks = window.block_count,
        compressed,
        "reading payload window"
    );

    let buf = read_window(reader, &window, &profile.archive_key)?;
    if buf.len() < needed {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "{}: payload needs {needed} B from 0x{:X} but the container ends after {} B",
                entry.name,
                window.start(),
                buf.len()
            ),
        )
        .into());
    }
    let slice = buf.get(first..).unwrap_or_default();

    let data = if compressed {
        let mut payload = slice[..slice.len().min(record.compressed_size as usize)].to_vec();
        apply_keystream_segmented(&mut key, &mut payload, first);
        get_codec(CodecId::Deflate).decode(&payload, record.uncompressed_size as usize)?
    } else {
        get_codec(CodecId::Stored).decode(slice, record.uncompressed_size as usize)?
    };
    Ok((record, data))
}
