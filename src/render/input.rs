//! Scratch input files
//!
//! The renderer reads its HTML from disk, so each request decodes its
//! base64 payload into a uniquely named `.html` file. The returned
//! [`TempPath`] deletes the file when dropped, which covers every exit
//! path of the request including unwinding.

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::read::DecoderReader;
use tempfile::TempPath;

/// Decode `contents` into a fresh file under `dir`.
///
/// Line breaks inside the payload are ignored; anything else outside the
/// standard alphabet fails with `InvalidData` after the partial file has
/// been removed.
pub fn write_input(dir: &Path, contents: &str) -> io::Result<TempPath> {
    let mut file = tempfile::Builder::new()
        .prefix("render-")
        .suffix(".html")
        .tempfile_in(dir)?;

    let payload = strip_line_breaks(contents);
    let mut decoder = DecoderReader::new(payload.as_ref(), &STANDARD);
    // On error `file` drops here, closing and unlinking it.
    io::copy(&mut decoder, file.as_file_mut())?;
    file.as_file_mut().flush()?;

    Ok(file.into_temp_path())
}

fn strip_line_breaks(contents: &str) -> Cow<'_, [u8]> {
    if contents.contains(['\r', '\n']) {
        Cow::Owned(
            contents
                .bytes()
                .filter(|b| *b != b'\r' && *b != b'\n')
                .collect(),
        )
    } else {
        Cow::Borrowed(contents.as_bytes())
    }
}
