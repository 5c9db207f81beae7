//! Decks: named, ordered groups of notes.

use crate::core::note::Note;

/// A deck and the notes to import into it.
///
/// Note order only decides row order in the written collection.
#[derive(Debug, Clone)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub description: String,
    notes: Vec<Note>,
}

impl Deck {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            notes: Vec::new(),
        }
    }

    /// Sets the description shown on the deck overview screen.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}
