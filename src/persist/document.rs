//! Reads and writes JSON documents, optionally gzip-compressed
//!
//! Compression is detected from the file name only. Documents read from an
//! already open reader are always treated as plain JSON text.
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use serde_json::ser::Formatter;
use tracing::debug;

use crate::persist::codec::FieldMap;
use crate::{ModulonError, ModulonResult, GZ_SUFFIX, JSON_SUFFIX};

/// Returns the path a document is written to
///
/// `.json` is appended if `path` does not already end with it, `.gz` is
/// appended on top if the document is compressed.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use modulon::persist::document_path;
///
/// assert_eq!(document_path("model", false), PathBuf::from("model.json"));
/// assert_eq!(document_path("model.json", false), PathBuf::from("model.json"));
/// assert_eq!(document_path("model", true), PathBuf::from("model.json.gz"));
/// assert_eq!(document_path("model.json", true), PathBuf::from("model.json.gz"));
/// ```
pub fn document_path<P: AsRef<Path>>(path: P, compress: bool) -> PathBuf {
    let mut name = path.as_ref().as_os_str().to_os_string();
    if !path.as_ref().to_string_lossy().ends_with(JSON_SUFFIX) {
        name.push(JSON_SUFFIX);
    }
    if compress {
        name.push(GZ_SUFFIX);
    }
    PathBuf::from(name)
}

/// Writes `map` as a JSON document and returns the final path
///
/// See [`document_path`] for the suffix handling. Compressed documents are
/// ASCII-only, all other characters are written as `\uXXXX` escapes.
///
/// # Errors
///
/// [`ModulonError::Io`] if the file cannot be created or written. A partially
/// written file may be left behind in that case.
pub fn write_document<P: AsRef<Path>>(
    map: &FieldMap,
    path: P,
    compress: bool,
) -> ModulonResult<PathBuf> {
    let path = document_path(path, compress);
    let file = File::create(&path)?;

    if compress {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        let mut serializer = serde_json::Serializer::with_formatter(&mut encoder, AsciiFormatter);
        map.serialize(&mut serializer).map_err(json_error)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, map).map_err(json_error)?;
        writer.flush()?;
    }

    debug!("wrote {} fields to {}", map.len(), path.display());
    Ok(path)
}

/// Reads a JSON document from `path`
///
/// Paths ending in `.gz` are decompressed first.
///
/// # Errors
///
/// - [`ModulonError::Io`]: The file does not exist or cannot be read. This
///   includes `.gz` files that are not valid gzip data.
/// - [`ModulonError::DocumentFormat`]: The content is not a JSON object
pub fn read_document<P: AsRef<Path>>(path: P) -> ModulonResult<FieldMap> {
    let path = path.as_ref();
    let file = File::open(path)?;
    debug!("reading document {}", path.display());
    if path.to_string_lossy().ends_with(GZ_SUFFIX) {
        read_document_from(GzDecoder::new(BufReader::new(file)))
    } else {
        read_document_from(BufReader::new(file))
    }
}

/// Reads an uncompressed JSON document from `reader`
///
/// There is no file name to detect compression from, so gzip content fails
/// with [`ModulonError::DocumentFormat`]. Wrap the reader in a
/// [`flate2::read::GzDecoder`] to read compressed data.
///
/// # Errors
///
/// - [`ModulonError::Io`]: Reading from `reader` failed
/// - [`ModulonError::DocumentFormat`]: The content is not a JSON object
pub fn read_document_from<R: Read>(reader: R) -> ModulonResult<FieldMap> {
    serde_json::from_reader(reader).map_err(json_error)
}

/// Separates I/O failures from malformed JSON
fn json_error(err: serde_json::Error) -> ModulonError {
    if err.is_io() {
        ModulonError::Io(err.into())
    } else {
        ModulonError::DocumentFormat(err)
    }
}

/// Compact JSON formatter that escapes every non-ASCII character
///
/// Surrogate pairs are written for characters outside the basic multilingual plane.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (idx, c) in fragment.char_indices() {
            if c.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..idx])?;
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = idx + c.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::{json, Value};

    fn field_map() -> FieldMap {
        let Value::Object(map) = json!({
            "M": {"index": ["g1", "g2"], "columns": ["IM1"], "data": [[0.5], [-1.25]]},
            "gene_table": {"index": ["g1"], "columns": ["product"], "data": [["β-galactosidase"]]},
            "threshold_method": "dagostino",
            "dagostino_cutoff": 550,
            "tfs": ["CRP"],
            "X": null,
        }) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn uncompressed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_document(&field_map(), dir.path().join("model"), false).unwrap();
        assert_eq!(path, dir.path().join("model.json"));
        assert_eq!(read_document(&path).unwrap(), field_map());
    }

    #[test]
    fn compressed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_document(&field_map(), dir.path().join("model.json"), true).unwrap();
        assert_eq!(path, dir.path().join("model.json.gz"));
        assert_eq!(read_document(&path).unwrap(), field_map());
    }

    #[test]
    fn compressed_and_plain_are_interchangeable() {
        let dir = tempfile::tempdir().unwrap();
        let plain = write_document(&field_map(), dir.path().join("plain"), false).unwrap();
        let gz = write_document(&field_map(), dir.path().join("gz"), true).unwrap();
        assert_eq!(read_document(plain).unwrap(), read_document(gz).unwrap());
    }

    #[test]
    fn compressed_document_is_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_document(&field_map(), dir.path().join("model"), true).unwrap();

        let mut text = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert!(text.is_ascii());
        assert!(text.contains("\\u03b2-galactosidase"));
    }

    #[test]
    fn escapes_astral_characters() {
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter);
        json!({"k": "a\u{1F9EC}b"}).serialize(&mut serializer).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#"{"k":"a\ud83e\uddecb"}"#);
    }

    #[test]
    fn plain_document_is_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_document(&field_map(), dir.path().join("model"), false).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("β-galactosidase"));
    }

    #[test]
    fn read_from_reader() {
        let text = serde_json::to_string(&field_map()).unwrap();
        let map = read_document_from(text.as_bytes()).unwrap();
        assert_eq!(map, field_map());
    }

    #[test]
    fn gzip_reader_is_not_detected() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"M": null}"#).unwrap();
        let bytes = encoder.finish().unwrap();
        assert!(matches!(
            read_document_from(&bytes[..]),
            Err(ModulonError::DocumentFormat(_))
        ));
        let map = read_document_from(GzDecoder::new(&bytes[..])).unwrap();
        assert_eq!(map["M"], Value::Null);
    }

    #[test]
    fn not_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            read_document(&path),
            Err(ModulonError::DocumentFormat(_))
        ));
    }

    #[test]
    fn gz_suffix_without_gzip_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json.gz");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(read_document(&path), Err(ModulonError::Io(_))));

        std::fs::write(&path, r#"{"M": null}"#).unwrap();
        assert!(matches!(read_document(&path), Err(ModulonError::Io(_))));
    }

    #[test]
    fn not_an_object() {
        assert!(matches!(
            read_document_from("[1, 2, 3]".as_bytes()),
            Err(ModulonError::DocumentFormat(_))
        ));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_document(dir.path().join("missing.json")),
            Err(ModulonError::Io(_))
        ));
        assert!(matches!(
            read_document(dir.path().join("missing.json.gz")),
            Err(ModulonError::Io(_))
        ));
    }

    #[test]
    fn unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let res = write_document(&field_map(), dir.path().join("no/such/dir/model"), false);
        assert!(matches!(res, Err(ModulonError::Io(_))));
    }
}
