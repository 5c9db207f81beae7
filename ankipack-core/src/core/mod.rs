//! Internal domain modules for the ankipack core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod config;
pub mod deck;
pub mod error;
pub mod export;
pub mod guid;
pub mod note;
pub mod note_type;
pub mod package;
pub mod requirements;
pub mod storage;

#[doc(inline)]
pub use config::{CollectionConfig, DeckConfig, DeckRecord, LapseOptions, NewCardOptions, ReviewOptions};
#[doc(inline)]
pub use deck::Deck;
#[doc(inline)]
pub use error::{AnkipackError, Result};
#[doc(inline)]
pub use export::{write_archive, COLLECTION_ENTRY, MEDIA_MANIFEST_ENTRY};
#[doc(inline)]
pub use guid::guid_for;
#[doc(inline)]
pub use note::Note;
#[doc(inline)]
pub use note_type::{Field, NoteFields, NoteType, NoteTypeBuilder, NoteTypeKind, Quorum, Requirement, Template};
#[doc(inline)]
pub use package::{EncodeSummary, MediaFile, MediaSource, Package};
