//! Notes and card-ordinal resolution.

use crate::core::guid::guid_for;
use crate::core::note_type::{NoteType, NoteTypeKind, Quorum};
use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

/// Separator between field values in the `notes.flds` column.
pub const FIELD_SEPARATOR: &str = "\u{1f}";

static CLOZE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{c(\d+)::.+?\}\}").expect("cloze marker pattern is valid"));

/// One set of field values for a [`NoteType`].
///
/// Created through [`NoteType::create_note`], which guarantees the value
/// count matches the note type.
#[derive(Debug, Clone)]
pub struct Note {
    note_type: Arc<NoteType>,
    fields: Vec<String>,
    guid: Option<String>,
}

impl Note {
    pub(crate) fn new(note_type: Arc<NoteType>, fields: Vec<String>, guid: Option<String>) -> Self {
        Self {
            note_type,
            fields,
            guid,
        }
    }

    pub fn note_type(&self) -> &Arc<NoteType> {
        &self.note_type
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The explicit guid if one was given, otherwise the content hash of the fields.
    pub fn guid(&self) -> Cow<'_, str> {
        match &self.guid {
            Some(guid) => Cow::Borrowed(guid.as_str()),
            None => Cow::Owned(guid_for(&self.fields)),
        }
    }

    /// Field values as stored in the `notes.flds` column.
    pub fn joined_fields(&self) -> String {
        self.fields.join(FIELD_SEPARATOR)
    }

    /// Template ordinals this note produces cards for.
    ///
    /// Standard note types follow rule declaration order. Cloze note types
    /// return ascending ordinals and always at least `[0]`.
    pub fn card_ords(&self) -> Vec<usize> {
        match self.note_type.kind() {
            NoteTypeKind::Standard => self.standard_card_ords(),
            NoteTypeKind::Cloze => self.cloze_card_ords(),
        }
    }

    fn is_blank(&self, ord: usize) -> bool {
        self.fields.get(ord).map_or(true, |value| value.trim().is_empty())
    }

    fn standard_card_ords(&self) -> Vec<usize> {
        self.note_type
            .requirements()
            .iter()
            .filter(|rule| match rule.quorum {
                Quorum::All => rule.field_ords.iter().all(|ord| !self.is_blank(*ord)),
                Quorum::Any => rule.field_ords.iter().any(|ord| !self.is_blank(*ord)),
            })
            .map(|rule| rule.template_ord)
            .collect()
    }

    fn cloze_card_ords(&self) -> Vec<usize> {
        let mut ords = BTreeSet::new();
        for field_ord in self.note_type.cloze_field_ords() {
            let Some(text) = self.fields.get(*field_ord) else {
                continue;
            };
            for caps in CLOZE_MARKER_RE.captures_iter(text) {
                // Markers are numbered from 1; card ordinals from 0.
                match caps[1].parse::<usize>() {
                    Ok(n) if n > 0 => {
                        ords.insert(n - 1);
                    }
                    _ => {}
                }
            }
        }
        if ords.is_empty() {
            return vec![0];
        }
        ords.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::note_type::Template;

    fn two_field_all() -> Arc<NoteType> {
        NoteType::builder(1, "Pair")
            .fields(["A", "B"])
            .template(Template::new("{{A}}{{B}}", ""))
            .requirement(0, Quorum::All, vec![0, 1])
            .build()
            .unwrap()
    }

    fn cloze() -> Arc<NoteType> {
        NoteType::cloze_builder(2, "Cloze")
            .fields(["Text", "Back Extra"])
            .template(Template::new("{{cloze:Text}}", "{{cloze:Text}}<br>{{Back Extra}}"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_all_quorum_needs_every_field() {
        let nt = two_field_all();
        assert_eq!(nt.create_note(["x", "y"], None).unwrap().card_ords(), vec![0]);
        assert!(nt.create_note(["", "y"], None).unwrap().card_ords().is_empty());
        assert!(nt.create_note(["x", "  \n"], None).unwrap().card_ords().is_empty());
    }

    #[test]
    fn test_any_quorum_needs_one_field() {
        let nt = NoteType::builder(1, "Either")
            .fields(["A", "B"])
            .template(Template::new("{{A}}{{B}}", ""))
            .template(Template::new("{{B}}", ""))
            .requirement(0, Quorum::Any, vec![0, 1])
            .requirement(1, Quorum::All, vec![1])
            .build()
            .unwrap();
        assert_eq!(nt.create_note(["", "y"], None).unwrap().card_ords(), vec![0, 1]);
        assert_eq!(nt.create_note(["x", ""], None).unwrap().card_ords(), vec![0]);
        assert!(nt.create_note(["", ""], None).unwrap().card_ords().is_empty());
    }

    #[test]
    fn test_rule_order_is_preserved() {
        let nt = NoteType::builder(1, "Ordered")
            .fields(["A"])
            .template(Template::new("{{A}}", ""))
            .template(Template::new("{{A}}", ""))
            .requirement(1, Quorum::All, vec![0])
            .requirement(0, Quorum::All, vec![0])
            .build()
            .unwrap();
        assert_eq!(nt.create_note(["x"], None).unwrap().card_ords(), vec![1, 0]);
    }

    #[test]
    fn test_cloze_markers_map_to_zero_based_ords() {
        let note = cloze().create_note(["{{c1::A}} {{c2::B}}", ""], None).unwrap();
        assert_eq!(note.card_ords(), vec![0, 1]);
    }

    #[test]
    fn test_cloze_without_markers_defaults_to_first_card() {
        let note = cloze().create_note(["plain text", "{{c3::ignored}}"], None).unwrap();
        assert_eq!(note.card_ords(), vec![0]);
    }

    #[test]
    fn test_cloze_duplicates_collapse_and_zero_is_skipped() {
        let note = cloze()
            .create_note(["{{c3::x}} {{c3::y}} {{c0::z}} {{c1::multi\nline}}", ""], None)
            .unwrap();
        assert_eq!(note.card_ords(), vec![0, 2]);
    }

    #[test]
    fn test_cloze_marker_with_hint() {
        let note = cloze().create_note(["{{c2::Paris::capital}}", ""], None).unwrap();
        assert_eq!(note.card_ords(), vec![1]);
    }

    #[test]
    fn test_guid_prefers_explicit_value() {
        let nt = two_field_all();
        let hashed = nt.create_note(["a", "b"], None).unwrap();
        assert_eq!(hashed.guid(), guid_for(&["a", "b"]));

        let explicit = nt.create_note(["a", "b"], Some("my-guid".to_string())).unwrap();
        assert_eq!(explicit.guid(), "my-guid");
    }

    #[test]
    fn test_joined_fields_uses_unit_separator() {
        let note = two_field_all().create_note(["x", "y"], None).unwrap();
        assert_eq!(note.joined_fields(), "x\u{1f}y");
    }
}
