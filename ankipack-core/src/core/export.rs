//! Writes the `.apkg` zip container.
//!
//! Layout:
//! - `collection.anki2`: the SQLite collection
//! - `0`, `1`, ...: media contents, numbered in declaration order
//! - `media`: JSON object mapping each number to the media file's name

use crate::core::package::{MediaFile, MediaSource};
use crate::Result;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive entry holding the collection database.
pub const COLLECTION_ENTRY: &str = "collection.anki2";

/// Archive entry holding the media manifest.
pub const MEDIA_MANIFEST_ENTRY: &str = "media";

/// Maps each media item's archive index to its logical file name.
pub fn media_manifest(media: &[MediaFile]) -> BTreeMap<usize, &str> {
    media
        .iter()
        .enumerate()
        .map(|(index, item)| (index, item.name.as_str()))
        .collect()
}

/// Writes the package archive to `writer` and returns it once finished.
///
/// `collection_path` must point at a closed collection database; it is read
/// back verbatim into the archive.
///
/// # Errors
///
/// Returns [`crate::AnkipackError::Io`] if the collection or a media file
/// cannot be read and [`crate::AnkipackError::Archive`] if writing fails.
pub fn write_archive<W: Write + Seek>(writer: W, collection_path: &Path, media: &[MediaFile]) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(COLLECTION_ENTRY, options)?;
    io::copy(&mut File::open(collection_path)?, &mut zip)?;

    for (index, item) in media.iter().enumerate() {
        zip.start_file(index.to_string(), options)?;
        match &item.source {
            MediaSource::Bytes(data) => zip.write_all(data)?,
            MediaSource::Path(path) => {
                io::copy(&mut File::open(path)?, &mut zip)?;
            }
        }
    }

    let manifest = serde_json::to_string(&media_manifest(media))?;
    zip.start_file(MEDIA_MANIFEST_ENTRY, options)?;
    zip.write_all(manifest.as_bytes())?;

    Ok(zip.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnkipackError;
    use std::io::{Cursor, Read};
    use tempfile::NamedTempFile;
    use zip::ZipArchive;

    fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        archive.by_name(name).unwrap().read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_media_manifest_serialization() {
        let media = vec![
            MediaFile::from_bytes(b"a".to_vec(), "cat.png"),
            MediaFile::from_bytes(b"b".to_vec(), "dog.mp3"),
        ];
        let json = serde_json::to_string(&media_manifest(&media)).unwrap();
        assert_eq!(json, r#"{"0":"cat.png","1":"dog.mp3"}"#);
        assert_eq!(serde_json::to_string(&media_manifest(&[])).unwrap(), "{}");
    }

    #[test]
    fn test_write_archive_layout() {
        let db = NamedTempFile::new().unwrap();
        std::fs::write(db.path(), b"collection bytes").unwrap();

        let mut on_disk = NamedTempFile::new().unwrap();
        on_disk.write_all(b"from disk").unwrap();

        let media = vec![
            MediaFile::from_bytes(b"inline".to_vec(), "inline.txt"),
            MediaFile::from_path(on_disk.path(), Some("disk.txt")),
        ];
        let cursor = write_archive(Cursor::new(Vec::new()), db.path(), &media).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(archive.len(), 4);
        assert_eq!(read_entry(&mut archive, COLLECTION_ENTRY), b"collection bytes");
        assert_eq!(read_entry(&mut archive, "0"), b"inline");
        assert_eq!(read_entry(&mut archive, "1"), b"from disk");

        let manifest: BTreeMap<String, String> =
            serde_json::from_slice(&read_entry(&mut archive, MEDIA_MANIFEST_ENTRY)).unwrap();
        assert_eq!(manifest.get("0").map(String::as_str), Some("inline.txt"));
        assert_eq!(manifest.get("1").map(String::as_str), Some("disk.txt"));
    }

    #[test]
    fn test_missing_media_file_is_io_error() {
        let db = NamedTempFile::new().unwrap();
        let media = vec![MediaFile::from_path("/definitely/not/here.png", None)];
        let result = write_archive(Cursor::new(Vec::new()), db.path(), &media);
        assert!(matches!(result, Err(AnkipackError::Io(_))));
    }
}
