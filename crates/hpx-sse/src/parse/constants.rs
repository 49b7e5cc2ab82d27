//! Constants shared by the line parser, the event builder and the writer.

use bytes_utils::Str;

/// Newline byte
pub(crate) const LF: u8 = b'\n';
/// Carriage return byte
pub(crate) const CR: u8 = b'\r';
/// Field separator byte
pub(crate) const COLON: u8 = b':';

/// Byte Order Mark as char
const BOM_CHAR: char = '\u{FEFF}';
const BOM_LEN: usize = BOM_CHAR.len_utf8();
/// UTF-8 encoding of the BOM, skipped once at the start of a stream.
pub(crate) const BOM: &[u8; BOM_LEN] = &{
    let mut buf = [0u8; BOM_LEN];
    BOM_CHAR.encode_utf8(&mut buf);
    buf
};

/// Empty instance of [`Str`], from an `&'static ""`
pub(crate) const EMPTY_STR: Str = Str::from_static("");
/// Default event type (`"message"`)
pub(crate) const MESSAGE_STR: Str = Str::from_static("message");
