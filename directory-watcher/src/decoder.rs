//! Decoding of raw change-notification buffers.
//!
//! A buffer holds one or more variable-length records laid out back to back:
//!
//! ```text
//! 0        4        8        12
//! ┌────────┬────────┬────────┬──────────────────────────┐
//! │ next   │ action │ length │ name (UTF-16LE, length B) │ ... next record at +next
//! └────────┴────────┴────────┴──────────────────────────┘
//! ```
//!
//! `next` is zero on the last record. Decoding runs in two stages: [`parse`]
//! turns bytes into [`RawRecord`]s, [`decode`] pairs renames, cleans names and
//! drops recycle-bin noise. Watch backends that already deliver typed records
//! skip straight to [`decode`].

use crate::error::DecodeError;
use crate::event::{ChangeAction, ChangeEvent, Decoded, RawAction, RawRecord};

/// Size of the fixed record header.
const HEADER_LEN: usize = 12;

/// Reserved system-trash folder name; any event naming it is dropped.
pub const RECYCLE_BIN: &str = "$RECYCLE.BIN";

/// Suffix editors append to files that are still being written.
const PARTIAL_SUFFIX: char = '~';

/// Parse a raw buffer into records, in buffer order.
///
/// An empty buffer (the OS reporting an overflow) yields no records.
pub fn parse(buf: &[u8]) -> Result<Vec<RawRecord>, DecodeError> {
    let mut records = Vec::new();
    if buf.is_empty() {
        return Ok(records);
    }

    let mut offset = 0usize;
    loop {
        let (next, code, name_len) = match (
            read_u32(buf, offset),
            read_u32(buf, offset + 4),
            read_u32(buf, offset + 8),
        ) {
            (Some(next), Some(code), Some(len)) => (next as usize, code, len as usize),
            _ => {
                return Err(DecodeError::TruncatedHeader {
                    offset,
                    len: buf.len(),
                });
            }
        };

        if name_len % 2 != 0 {
            return Err(DecodeError::OddNameLength(name_len));
        }
        let start = offset + HEADER_LEN;
        let name_bytes = buf
            .get(start..start + name_len)
            .ok_or(DecodeError::TruncatedName { offset, name_len })?;
        let units: Vec<u16> = name_bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        records.push(RawRecord::new(
            RawAction::from_code(code),
            String::from_utf16_lossy(&units),
        ));

        if next == 0 {
            return Ok(records);
        }
        if next < HEADER_LEN {
            return Err(DecodeError::BadNextOffset { offset, next });
        }
        offset += next;
    }
}

/// Decode parsed records into change events.
///
/// An old-name record immediately followed by a new-name record becomes a
/// rename pair. An old-name record with nothing after it in the same batch is
/// reported as a plain removal.
pub fn decode(records: &[RawRecord]) -> Vec<Decoded> {
    let mut out = Vec::with_capacity(records.len());
    let mut iter = records.iter().peekable();

    while let Some(record) = iter.next() {
        let name = clean_name(&record.name);
        match record.action {
            RawAction::Added => push_change(&mut out, ChangeAction::Added, name),
            RawAction::Removed => push_change(&mut out, ChangeAction::Removed, name),
            RawAction::Modified => push_change(&mut out, ChangeAction::Modified, name),
            RawAction::RenamedOldName => {
                match iter.next_if(|next| next.action == RawAction::RenamedNewName) {
                    Some(new) => {
                        push_change(&mut out, ChangeAction::RenamedFrom, name);
                        push_change(&mut out, ChangeAction::RenamedTo, clean_name(&new.name));
                    }
                    None => push_change(&mut out, ChangeAction::Removed, name),
                }
            }
            RawAction::RenamedNewName => push_change(&mut out, ChangeAction::RenamedTo, name),
            RawAction::Unknown(code) => out.push(Decoded::Unknown {
                code,
                name: name.to_string(),
            }),
        }
    }

    out
}

/// Parse and decode one raw buffer.
pub fn decode_buffer(buf: &[u8]) -> Result<Vec<Decoded>, DecodeError> {
    Ok(decode(&parse(buf)?))
}

/// Serialize records in the wire layout, each record aligned to four bytes.
///
/// Hosts that capture notification buffers natively hand them over in this
/// layout; it is also how replay buffers are built.
pub fn encode(records: &[RawRecord]) -> Vec<u8> {
    let mut buf = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let units: Vec<u16> = record.name.encode_utf16().collect();
        let name_len = units.len() * 2;
        let padded = (HEADER_LEN + name_len).div_ceil(4) * 4;
        let next = if i + 1 == records.len() { 0 } else { padded };

        buf.extend_from_slice(&(next as u32).to_le_bytes());
        buf.extend_from_slice(&record.action.code().to_le_bytes());
        buf.extend_from_slice(&(name_len as u32).to_le_bytes());
        for unit in units {
            buf.extend_from_slice(&unit.to_le_bytes());
        }
        if next != 0 {
            buf.resize(buf.len() + padded - HEADER_LEN - name_len, 0);
        }
    }
    buf
}

/// Whether a name lies in (or is) the system trash folder.
pub fn is_recycle_bin(name: &str) -> bool {
    name.contains(RECYCLE_BIN)
}

fn push_change(out: &mut Vec<Decoded>, action: ChangeAction, name: &str) {
    if is_recycle_bin(name) {
        return;
    }
    out.push(Decoded::Change(ChangeEvent::new(action, name)));
}

fn clean_name(name: &str) -> &str {
    name.strip_suffix(PARTIAL_SUFFIX).unwrap_or(name)
}

fn read_u32(buf: &[u8], at: usize) -> Option<u32> {
    let bytes: [u8; 4] = buf.get(at..at + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}
