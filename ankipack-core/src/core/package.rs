//! Packages: decks plus media, encoded into a single `.apkg` file.

use crate::core::config::{CollectionConfig, DeckConfig, DeckRecord};
use crate::core::export::{self, COLLECTION_ENTRY};
use crate::core::storage::{CardRow, Collection, CollectionRow, NoteRow};
use crate::{Deck, NoteType, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Where a media item's bytes come from.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSource {
    /// Contents held in memory.
    Bytes(Vec<u8>),
    /// Contents read from disk when the package is written.
    Path(PathBuf),
}

/// A media file bundled with the package, referenced from card text by `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    pub name: String,
    pub source: MediaSource,
}

impl MediaFile {
    pub fn from_bytes(data: Vec<u8>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: MediaSource::Bytes(data),
        }
    }

    /// References a file on disk. The name defaults to the path's file name.
    pub fn from_path(path: impl AsRef<Path>, name: Option<&str>) -> Self {
        let path = path.as_ref();
        let name = match name {
            Some(name) => name.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
        };
        Self {
            name,
            source: MediaSource::Path(path.to_path_buf()),
        }
    }
}

/// Timestamps stamped onto one encode.
#[derive(Debug, Clone, Copy)]
struct EncodeClock {
    seconds: i64,
    millis: i64,
}

impl EncodeClock {
    fn now() -> Self {
        let now = chrono::Utc::now();
        Self {
            seconds: now.timestamp(),
            millis: now.timestamp_millis(),
        }
    }
}

/// Row and card counts produced by one encode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeSummary {
    pub note_types: usize,
    pub notes: usize,
    pub cards: usize,
    pub media: usize,
}

/// A set of decks and media files to export.
///
/// Build it on one thread, then call [`write_to_file`](Self::write_to_file).
#[derive(Debug, Clone, Default)]
pub struct Package {
    decks: Vec<Deck>,
    media: Vec<MediaFile>,
    collection_config: CollectionConfig,
    deck_config: DeckConfig,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default collection settings and deck options for this package.
    pub fn with_config(mut self, collection_config: CollectionConfig, deck_config: DeckConfig) -> Self {
        self.collection_config = collection_config;
        self.deck_config = deck_config;
        self
    }

    pub fn add_deck(&mut self, deck: Deck) {
        self.decks.push(deck);
    }

    /// Bundles in-memory media contents under `name`.
    pub fn add_media(&mut self, data: Vec<u8>, name: impl Into<String>) {
        self.media.push(MediaFile::from_bytes(data, name));
    }

    /// Bundles a file from disk; it is read when the package is written.
    pub fn add_media_file(&mut self, path: impl AsRef<Path>, name: Option<&str>) {
        self.media.push(MediaFile::from_path(path, name));
    }

    pub fn decks(&self) -> &[Deck] {
        &self.decks
    }

    pub fn media(&self) -> &[MediaFile] {
        &self.media
    }

    /// Distinct note types referenced by any note, in first-seen order.
    ///
    /// Two different note types sharing an id is a caller error: the one
    /// seen last replaces the earlier one in place.
    pub fn note_types(&self) -> Vec<&NoteType> {
        let mut collected: Vec<&NoteType> = Vec::new();
        let mut positions: HashMap<i64, usize> = HashMap::new();
        for note in self.decks.iter().flat_map(|deck| deck.notes()) {
            let note_type = note.note_type().as_ref();
            match positions.get(&note_type.id()).copied() {
                Some(pos) => {
                    if !std::ptr::eq(collected[pos], note_type) {
                        log::warn!(
                            "note types '{}' and '{}' share id {}; keeping '{}'",
                            collected[pos].name(),
                            note_type.name(),
                            note_type.id(),
                            note_type.name()
                        );
                    }
                    collected[pos] = note_type;
                }
                None => {
                    positions.insert(note_type.id(), collected.len());
                    collected.push(note_type);
                }
            }
        }
        collected
    }

    /// Encodes the package into an `.apkg` file at `path`.
    ///
    /// The file is written in place; write to a temporary name and rename if
    /// a partially written file must never be observed.
    ///
    /// # Errors
    ///
    /// Any database, serialization, media or archive failure aborts the
    /// encode and is returned unchanged.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<EncodeSummary> {
        let path = path.as_ref();
        let scratch = tempfile::tempdir()?;
        let collection_path = scratch.path().join(COLLECTION_ENTRY);

        let mut collection = Collection::create(&collection_path)?;
        let summary = self.write_collection(&mut collection, EncodeClock::now())?;
        // The archive reads the finished database back from disk.
        collection.close()?;

        let out = BufWriter::new(File::create(path)?);
        export::write_archive(out, &collection_path, &self.media)?.flush()?;

        let summary = EncodeSummary {
            media: self.media.len(),
            ..summary
        };
        log::info!(
            "wrote {} ({} notes, {} cards, {} media files)",
            path.display(),
            summary.notes,
            summary.cards,
            summary.media
        );
        Ok(summary)
    }

    fn write_collection(&self, collection: &mut Collection, clock: EncodeClock) -> Result<EncodeSummary> {
        let note_types = self.note_types();
        log::debug!("collected {} note types", note_types.len());

        let mut models = Map::new();
        for note_type in &note_types {
            models.insert(note_type.id().to_string(), note_type.to_json()?);
        }

        let mut decks = Map::new();
        for deck in &self.decks {
            let record = DeckRecord::new(deck.id, deck.name.clone(), deck.description.clone());
            decks.insert(deck.id.to_string(), serde_json::to_value(record)?);
        }

        let mut dconf = Map::new();
        dconf.insert(
            self.deck_config.id.to_string(),
            serde_json::to_value(&self.deck_config)?,
        );

        let col = CollectionRow {
            crt: clock.seconds,
            modified: clock.millis,
            scm: clock.millis,
            conf: serde_json::to_string(&self.collection_config)?,
            models: Value::Object(models).to_string(),
            decks: Value::Object(decks).to_string(),
            dconf: Value::Object(dconf).to_string(),
            tags: Value::Object(Map::new()).to_string(),
        };

        let tx = collection.connection_mut().transaction()?;
        Collection::insert_collection(&tx, &col)?;

        let mut note_id = 0;
        let mut card_id = 0;
        for deck in &self.decks {
            for note in deck.notes() {
                note_id += 1;
                let guid = note.guid();
                let flds = note.joined_fields();
                Collection::insert_note(
                    &tx,
                    &NoteRow {
                        id: note_id,
                        guid: &guid,
                        note_type_id: note.note_type().id(),
                        modified: clock.seconds,
                        flds: &flds,
                    },
                )?;

                let mut ords = note.card_ords();
                ords.sort_unstable();
                for ord in ords {
                    card_id += 1;
                    Collection::insert_card(
                        &tx,
                        &CardRow {
                            id: card_id,
                            note_id,
                            deck_id: deck.id,
                            ord,
                            modified: clock.seconds,
                        },
                    )?;
                }
            }
        }
        tx.commit()?;
        log::debug!("inserted {note_id} notes and {card_id} cards");

        Ok(EncodeSummary {
            note_types: note_types.len(),
            notes: note_id as usize,
            cards: card_id as usize,
            media: 0,
        })
    }
}
