//! Descriptor payload decoding
//!
//! Descriptors normally arrive as JSON text. Some projects are served as a
//! zip container instead; the descriptor is then the `project.json` entry.

use std::io::{Cursor, Read};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::constants::archive::DESCRIPTOR_ENTRY;
use crate::errors::{DescriptorError, DescriptorResult};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Whether the payload starts with an opening brace, ignoring a BOM and leading whitespace
pub fn looks_like_json(payload: &[u8]) -> bool {
    let payload = payload.strip_prefix(UTF8_BOM).unwrap_or(payload);
    payload
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
}

/// Decode the payload into descriptor JSON text
pub fn decode_descriptor_text(payload: &[u8]) -> DescriptorResult<String> {
    let text_bytes = if looks_like_json(payload) {
        payload.to_vec()
    } else {
        extract_entry(payload, DESCRIPTOR_ENTRY)?
    };

    let text = String::from_utf8(text_bytes).map_err(|e| DescriptorError::Parse {
        reason: format!("descriptor is not valid UTF-8: {}", e),
    })?;

    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// Read one named entry out of a zip container
pub fn extract_entry(container: &[u8], name: &str) -> DescriptorResult<Vec<u8>> {
    let mut archive =
        ZipArchive::new(Cursor::new(container)).map_err(|e| DescriptorError::InvalidContainer {
            reason: e.to_string(),
        })?;

    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(DescriptorError::MissingContainerEntry {
                entry: name.to_string(),
            })
        }
        Err(e) => {
            return Err(DescriptorError::InvalidContainer {
                reason: e.to_string(),
            })
        }
    };

    let mut contents = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut contents)
        .map_err(|e| DescriptorError::InvalidContainer {
            reason: e.to_string(),
        })?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        for (name, contents) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(contents).unwrap();
        }
        zip.finish().unwrap();
        buffer
    }

    #[test]
    fn test_json_detection() {
        assert!(looks_like_json(b"{\"targets\":[]}"));
        assert!(looks_like_json(b"  \n{}"));
        assert!(looks_like_json(b"\xEF\xBB\xBF{}"));
        assert!(!looks_like_json(b"PK\x03\x04"));
        assert!(!looks_like_json(b"[]"));
        assert!(!looks_like_json(b""));
    }

    #[test]
    fn test_plain_json_passes_through() {
        let text = decode_descriptor_text(b"{\"targets\":[]}").unwrap();
        assert_eq!(text, "{\"targets\":[]}");

        let with_bom = decode_descriptor_text(b"\xEF\xBB\xBF{}").unwrap();
        assert_eq!(with_bom, "{}");
    }

    #[test]
    fn test_container_entry_is_extracted() {
        let container = zip_with(&[
            ("cat.svg", b"<svg/>"),
            ("project.json", b"{\"targets\":[]}"),
        ]);
        let text = decode_descriptor_text(&container).unwrap();
        assert_eq!(text, "{\"targets\":[]}");
    }

    #[test]
    fn test_container_without_descriptor() {
        let container = zip_with(&[("cat.svg", b"<svg/>")]);
        match decode_descriptor_text(&container) {
            Err(DescriptorError::MissingContainerEntry { entry }) => {
                assert_eq!(entry, "project.json")
            }
            other => panic!("Expected MissingContainerEntry, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_invalid_container() {
        assert!(matches!(
            decode_descriptor_text(b"not json and not zip"),
            Err(DescriptorError::InvalidContainer { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        assert!(matches!(
            decode_descriptor_text(b"{\xff\xfe}"),
            Err(DescriptorError::Parse { .. })
        ));
    }
}
