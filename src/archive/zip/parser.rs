//! Low-level ZIP archive parser.
//!
//! ZIP files are read from the end:
//! 1. Find the End of Central Directory (EOCD) at the buffer's tail
//! 2. If ZIP64, read the ZIP64 EOCD for large-archive field widths
//! 3. Walk the Central Directory to get metadata for all members
//! 4. For each member, read its Local File Header to locate the data
//!
//! All reads happen against the already-downloaded payload; header fields
//! are untrusted, so every derived offset is bounds-checked against the
//! buffer instead of being indexed directly.

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use std::io::{self, Cursor, ErrorKind, Read};

use crate::archive::ArchiveEntry;
use crate::error::{Error, Result};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for an EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

fn zip_error(e: impl std::fmt::Display) -> Error {
    Error::Archive(format!("invalid or unsupported zip format: {e}"))
}

fn truncated() -> io::Error {
    io::Error::new(ErrorKind::UnexpectedEof, "truncated archive")
}

/// Bounds-checked view into the payload.
fn slice(buf: &[u8], offset: u64, len: u64) -> io::Result<&[u8]> {
    let start = usize::try_from(offset).map_err(|_| truncated())?;
    let len = usize::try_from(len).map_err(|_| truncated())?;
    let end = start.checked_add(len).ok_or_else(truncated)?;
    buf.get(start..end).ok_or_else(truncated)
}

/// Extract every member of the archive, in central directory order.
pub(crate) fn unpack(buf: &[u8]) -> Result<Vec<ArchiveEntry>> {
    let (eocd, eocd_offset) = find_eocd(buf)?;

    let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
        let eocd64 = read_zip64_eocd(buf, eocd_offset).map_err(zip_error)?;
        (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
    } else {
        (
            eocd.cd_offset as u64,
            eocd.cd_size as u64,
            eocd.total_entries as u64,
        )
    };

    let cd_data = slice(buf, cd_offset, cd_size).map_err(zip_error)?;
    let mut cursor = Cursor::new(cd_data);

    let mut entries = Vec::new();
    for _ in 0..total_entries {
        let record = parse_cdfh(&mut cursor).map_err(zip_error)?;
        let data = read_entry_data(buf, &record)?;
        entries.push(ArchiveEntry {
            path: record.file_name,
            data,
        });
    }

    Ok(entries)
}

/// Find and parse the End of Central Directory record.
///
/// The EOCD sits at the end of the archive. The simple no-comment case is
/// tried first; otherwise the tail is searched backwards for a signature
/// whose comment length agrees with the remaining bytes.
fn find_eocd(buf: &[u8]) -> Result<(EndOfCentralDirectory, usize)> {
    // Common case: no archive comment, EOCD is exactly the last 22 bytes.
    if buf.len() >= EndOfCentralDirectory::SIZE {
        let offset = buf.len() - EndOfCentralDirectory::SIZE;
        let tail = &buf[offset..];

        if &tail[0..4] == EndOfCentralDirectory::SIGNATURE && &tail[20..22] == b"\x00\x00" {
            let eocd = EndOfCentralDirectory::from_bytes(tail).map_err(zip_error)?;
            return Ok((eocd, offset));
        }
    }

    // A trailing comment pushes the EOCD away from the end; search
    // backwards over the maximum comment span.
    let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE).min(buf.len());
    let search_start = buf.len() - search_size;
    let window = &buf[search_start..];

    for i in (0..window.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
        if &window[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
            // Candidate EOCD: the comment length field must account for
            // every byte after the record.
            let comment_len = u16::from_le_bytes([window[i + 20], window[i + 21]]) as usize;

            if comment_len == window.len() - i - EndOfCentralDirectory::SIZE {
                let eocd =
                    EndOfCentralDirectory::from_bytes(&window[i..i + EndOfCentralDirectory::SIZE])
                        .map_err(zip_error)?;
                return Ok((eocd, search_start + i));
            }
        }
    }

    Err(Error::Archive(
        "invalid or unsupported zip format: end of central directory record not found".to_string(),
    ))
}

/// Read the ZIP64 End of Central Directory record.
///
/// Called when the regular EOCD saturates its 16/32-bit fields; the ZIP64
/// EOCD Locator sits immediately before the regular EOCD and points at the
/// full-width record.
fn read_zip64_eocd(buf: &[u8], eocd_offset: usize) -> io::Result<Zip64EOCD> {
    let locator_offset = eocd_offset
        .checked_sub(Zip64EOCDLocator::SIZE)
        .ok_or_else(truncated)?;
    let locator = Zip64EOCDLocator::from_bytes(slice(
        buf,
        locator_offset as u64,
        Zip64EOCDLocator::SIZE as u64,
    )?)?;

    Zip64EOCD::from_bytes(slice(
        buf,
        locator.eocd64_offset,
        Zip64EOCD::MIN_SIZE as u64,
    )?)
}

/// Parse one Central Directory File Header from the cursor.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> io::Result<ZipEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            "bad central directory file header",
        ));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let _flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let _crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    // Lossy conversion keeps non-UTF8 member names readable instead of
    // failing the whole archive.
    let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

    // Walk the extra field for the ZIP64 extended information record
    // (header ID 0x0001); its fields are present only for the header
    // fields that saturated.
    let extra_field_end = cursor.position() + extra_field_length as u64;

    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()?;

        if header_id == 0x0001 {
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                lfh_offset = cursor.read_u64::<LittleEndian>()?;
            }
            break;
        }

        cursor.set_position(cursor.position() + field_size as u64);
    }

    cursor.set_position(extra_field_end);
    cursor.set_position(cursor.position() + file_comment_length as u64);

    Ok(ZipEntry {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        lfh_offset,
    })
}

/// Compute where a member's data starts.
///
/// The Local File Header repeats the variable-length name and extra field
/// with lengths that may differ from the central directory's, so the data
/// offset has to be derived from the LFH itself.
fn data_offset(buf: &[u8], entry: &ZipEntry) -> io::Result<u64> {
    let lfh = slice(buf, entry.lfh_offset, LFH_SIZE as u64)?;

    if &lfh[0..4] != LFH_SIGNATURE {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            "bad local file header",
        ));
    }

    let mut cursor = Cursor::new(lfh);
    cursor.set_position(26); // filename length field

    let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
    let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

    Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
}

/// Read and decompress one member's content.
fn read_entry_data(buf: &[u8], entry: &ZipEntry) -> Result<Vec<u8>> {
    let offset = data_offset(buf, entry).map_err(zip_error)?;
    let raw = slice(buf, offset, entry.compressed_size).map_err(zip_error)?;

    match entry.compression_method {
        CompressionMethod::Stored => Ok(raw.to_vec()),
        CompressionMethod::Deflate => {
            let mut data = Vec::new();
            DeflateDecoder::new(raw)
                .read_to_end(&mut data)
                .map_err(zip_error)?;
            Ok(data)
        }
        CompressionMethod::Unknown(method) => Err(Error::Archive(format!(
            "invalid or unsupported zip format: compression method {method}"
        ))),
    }
}
