//! Core library for ankipack: builds Anki `.apkg` flashcard packages.
//!
//! Define a [`NoteType`] with [`NoteType::builder`] (or
//! [`NoteType::cloze_builder`]), create notes through it, collect them in a
//! [`Deck`], add decks and media to a [`Package`] and call
//! [`Package::write_to_file`].
//!
//! ```no_run
//! use ankipack_core::{Deck, NoteType, Package, Quorum, Template};
//!
//! # fn main() -> ankipack_core::Result<()> {
//! let basic = NoteType::builder(1607392319, "Basic")
//!     .fields(["Front", "Back"])
//!     .template(Template::new("{{Front}}", "{{FrontSide}}<hr id=answer>{{Back}}"))
//!     .requirement(0, Quorum::All, vec![0])
//!     .build()?;
//!
//! let mut deck = Deck::new(2059400110, "Geography");
//! deck.add_note(basic.create_note(["Capital of France", "Paris"], None)?);
//!
//! let mut package = Package::new();
//! package.add_deck(deck);
//! package.write_to_file("geography.apkg")?;
//! # Ok(())
//! # }
//! ```
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use self::core::{
    config::{CollectionConfig, DeckConfig, DeckRecord, LapseOptions, NewCardOptions, ReviewOptions},
    deck::Deck,
    error::{AnkipackError, Result},
    export::{write_archive, COLLECTION_ENTRY, MEDIA_MANIFEST_ENTRY},
    guid::guid_for,
    note::Note,
    note_type::{Field, NoteFields, NoteType, NoteTypeBuilder, NoteTypeKind, Quorum, Requirement, Template},
    package::{EncodeSummary, MediaFile, MediaSource, Package},
};
