//! Note type definitions and the card-generation rule compiler.
//!
//! A [`NoteType`] is assembled through a [`NoteTypeBuilder`]; `build()` fills
//! in field and template ordinals and default names, validates the shape,
//! compiles the card-generation rule and returns an immutable, shareable
//! `Arc<NoteType>`. Notes are created through [`NoteType::create_note`].

use crate::core::note::Note;
use crate::core::requirements;
use crate::{AnkipackError, Result};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, LazyLock};

/// Default card stylesheet for standard note types.
pub const DEFAULT_CSS: &str = ".card {
 font-family: arial;
 font-size: 20px;
 text-align: center;
 color: black;
 background-color: white;
}";

/// Default card stylesheet for cloze note types.
pub const DEFAULT_CLOZE_CSS: &str = ".card {
 font-family: arial;
 font-size: 20px;
 text-align: center;
 color: black;
 background-color: white;
}

.cloze {
 font-weight: bold;
 color: blue;
}";

/// Default LaTeX preamble wrapped around LaTeX snippets in card text.
pub const DEFAULT_LATEX_PRE: &str = "\\documentclass[12pt]{article}
\\special{papersize=3in,5in}
\\usepackage[utf8]{inputenc}
\\usepackage{amssymb,amsmath}
\\pagestyle{empty}
\\setlength{\\parindent}{0in}
\\begin{document}";

/// Default LaTeX postamble.
pub const DEFAULT_LATEX_POST: &str = "\\end{document}";

/// Deck new cards land in unless a template overrides it.
pub const DEFAULT_DECK_ID: i64 = 1;

static CLOZE_CURLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{[^}]*?cloze:(?:[^}]?:)*(.+?)\}\}").expect("cloze directive pattern is valid")
});

static CLOZE_PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<%cloze:(.+?)%>").expect("cloze directive pattern is valid"));

/// Whether cards come from per-template requirement rules or cloze markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteTypeKind {
    Standard,
    Cloze,
}

impl NoteTypeKind {
    /// The `type` code stored in the collection's model table.
    pub fn code(self) -> u8 {
        match self {
            Self::Standard => 0,
            Self::Cloze => 1,
        }
    }
}

impl Serialize for NoteTypeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// How many of a rule's required fields must be filled for the card to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Quorum {
    Any,
    All,
}

/// One card-generation rule of a standard note type.
///
/// Serializes as Anki's `[ord, "any"|"all", [field ords]]` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub template_ord: usize,
    pub quorum: Quorum,
    pub field_ords: Vec<usize>,
}

impl Requirement {
    pub fn new(template_ord: usize, quorum: Quorum, field_ords: Vec<usize>) -> Self {
        Self {
            template_ord,
            quorum,
            field_ords,
        }
    }
}

impl Serialize for Requirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (self.template_ord, self.quorum, &self.field_ords).serialize(serializer)
    }
}

/// A named text slot of a note type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub ord: usize,
    pub sticky: bool,
    pub rtl: bool,
    pub font: String,
    pub size: u32,
    pub media: Vec<String>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ord: 0,
            sticky: false,
            rtl: false,
            font: "Arial".to_string(),
            size: 20,
            media: Vec::new(),
        }
    }

    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn rtl(mut self, rtl: bool) -> Self {
        self.rtl = rtl;
        self
    }

    pub fn sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Field {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A question/answer card template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    pub name: String,
    pub ord: usize,
    pub qfmt: String,
    pub afmt: String,
    /// Deck override for cards of this template; `None` uses the note's deck.
    pub did: Option<i64>,
    pub bqfmt: String,
    pub bafmt: String,
}

impl Template {
    /// Creates an unnamed template; `build()` names it `Card N` (or `Cloze`).
    pub fn new(qfmt: impl Into<String>, afmt: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            ord: 0,
            qfmt: qfmt.into(),
            afmt: afmt.into(),
            did: None,
            bqfmt: String::new(),
            bafmt: String::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn deck_override(mut self, deck_id: i64) -> Self {
        self.did = Some(deck_id);
        self
    }

    /// Sets the formats used by the card browser's question/answer columns.
    pub fn browser_formats(mut self, bqfmt: impl Into<String>, bafmt: impl Into<String>) -> Self {
        self.bqfmt = bqfmt.into();
        self.bafmt = bafmt.into();
        self
    }
}

/// Field values handed to [`NoteType::create_note`], either by position or by name.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteFields {
    Positional(Vec<String>),
    Named(Vec<(String, String)>),
}

impl NoteFields {
    /// Builds a named field list from `(field name, value)` pairs.
    pub fn named<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Named(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<S: Into<String>> From<Vec<S>> for NoteFields {
    fn from(values: Vec<S>) -> Self {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for NoteFields {
    fn from(values: [S; N]) -> Self {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<String>> From<HashMap<K, V>> for NoteFields {
    fn from(map: HashMap<K, V>) -> Self {
        Self::named(map)
    }
}

impl<K: Into<String>, V: Into<String>> From<BTreeMap<K, V>> for NoteFields {
    fn from(map: BTreeMap<K, V>) -> Self {
        Self::named(map)
    }
}

/// A compiled, immutable note type.
#[derive(Debug, Clone)]
pub struct NoteType {
    id: i64,
    name: String,
    kind: NoteTypeKind,
    fields: Vec<Field>,
    templates: Vec<Template>,
    css: String,
    latex_pre: String,
    latex_post: String,
    sort_field: usize,
    deck_id: i64,
    requirements: Vec<Requirement>,
    cloze_field_ords: Vec<usize>,
    field_index: HashMap<String, usize>,
}

impl NoteType {
    /// Starts a standard note type.
    pub fn builder(id: i64, name: impl Into<String>) -> NoteTypeBuilder {
        NoteTypeBuilder::new(id, name.into(), NoteTypeKind::Standard)
    }

    /// Starts a cloze note type.
    pub fn cloze_builder(id: i64, name: impl Into<String>) -> NoteTypeBuilder {
        NoteTypeBuilder::new(id, name.into(), NoteTypeKind::Cloze)
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NoteTypeKind {
        self.kind
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn sort_field(&self) -> usize {
        self.sort_field
    }

    /// Compiled requirement rules; empty for cloze note types.
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Ordinals of the fields the cloze template references, in directive order.
    pub fn cloze_field_ords(&self) -> &[usize] {
        &self.cloze_field_ords
    }

    pub fn field_ord(&self, name: &str) -> Option<usize> {
        self.field_index.get(name).copied()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Creates a note bound to this note type.
    ///
    /// Positional values must match the field count exactly. Named values
    /// must all name existing fields; fields left out are empty.
    ///
    /// # Errors
    ///
    /// Returns [`AnkipackError::FieldCount`] for a positional list of the
    /// wrong length and [`AnkipackError::UnknownField`] for an unknown name.
    pub fn create_note(
        self: &Arc<Self>,
        fields: impl Into<NoteFields>,
        guid: Option<String>,
    ) -> Result<Note> {
        let values = match fields.into() {
            NoteFields::Positional(values) => {
                if values.len() != self.fields.len() {
                    return Err(AnkipackError::FieldCount {
                        note_type: self.name.clone(),
                        expected: self.fields.len(),
                        actual: values.len(),
                    });
                }
                values
            }
            NoteFields::Named(pairs) => {
                let mut values = vec![String::new(); self.fields.len()];
                for (name, value) in pairs {
                    let ord = self.field_ord(&name).ok_or_else(|| AnkipackError::UnknownField {
                        note_type: self.name.clone(),
                        field: name.clone(),
                    })?;
                    values[ord] = value;
                }
                values
            }
        };
        Ok(Note::new(Arc::clone(self), values, guid))
    }

    /// The entry this note type contributes to the collection's `models` table.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let record = NoteTypeRecord {
            id: self.id,
            name: &self.name,
            kind: self.kind,
            modified: 0,
            usn: 0,
            sortf: self.sort_field,
            did: self.deck_id,
            tmpls: &self.templates,
            flds: &self.fields,
            css: &self.css,
            latex_pre: &self.latex_pre,
            latex_post: &self.latex_post,
            tags: &[],
            vers: &[],
            req: &self.requirements,
        };
        Ok(serde_json::to_value(record)?)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NoteTypeRecord<'a> {
    id: i64,
    name: &'a str,
    #[serde(rename = "type")]
    kind: NoteTypeKind,
    #[serde(rename = "mod")]
    modified: i64,
    usn: i64,
    sortf: usize,
    did: i64,
    tmpls: &'a [Template],
    flds: &'a [Field],
    css: &'a str,
    latex_pre: &'a str,
    latex_post: &'a str,
    tags: &'a [String],
    vers: &'a [i64],
    req: &'a [Requirement],
}

/// Collects a note type definition; see [`NoteType::builder`].
#[derive(Debug, Clone)]
pub struct NoteTypeBuilder {
    id: i64,
    name: String,
    kind: NoteTypeKind,
    fields: Vec<Field>,
    templates: Vec<Template>,
    css: Option<String>,
    latex_pre: Option<String>,
    latex_post: Option<String>,
    sort_field: usize,
    deck_id: i64,
    requirements: Option<Vec<Requirement>>,
}

impl NoteTypeBuilder {
    fn new(id: i64, name: String, kind: NoteTypeKind) -> Self {
        Self {
            id,
            name,
            kind,
            fields: Vec::new(),
            templates: Vec::new(),
            css: None,
            latex_pre: None,
            latex_post: None,
            sort_field: 0,
            deck_id: DEFAULT_DECK_ID,
            requirements: None,
        }
    }

    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn fields<F: Into<Field>>(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn template(mut self, template: Template) -> Self {
        self.templates.push(template);
        self
    }

    pub fn css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    pub fn latex(mut self, pre: impl Into<String>, post: impl Into<String>) -> Self {
        self.latex_pre = Some(pre.into());
        self.latex_post = Some(post.into());
        self
    }

    pub fn sort_field(mut self, ord: usize) -> Self {
        self.sort_field = ord;
        self
    }

    pub fn deck_id(mut self, deck_id: i64) -> Self {
        self.deck_id = deck_id;
        self
    }

    /// Adds an explicit requirement rule. Once any rule is given, rules are
    /// no longer derived from the templates. Cloze note types take no rules.
    pub fn requirement(mut self, template_ord: usize, quorum: Quorum, field_ords: Vec<usize>) -> Self {
        self.requirements
            .get_or_insert_with(Vec::new)
            .push(Requirement::new(template_ord, quorum, field_ords));
        self
    }

    pub fn requirements(mut self, requirements: Vec<Requirement>) -> Self {
        self.requirements = Some(requirements);
        self
    }

    /// Normalizes and validates the definition and compiles its card rule.
    ///
    /// # Errors
    ///
    /// Returns [`AnkipackError::Shape`] for empty or duplicate field names,
    /// more than one cloze template, requirement rules on a cloze note type,
    /// an out-of-range sort field, requirement rules naming unknown ordinals,
    /// or a template whose question ignores every field.
    pub fn build(self) -> Result<Arc<NoteType>> {
        let Self {
            id,
            name,
            kind,
            mut fields,
            mut templates,
            css,
            latex_pre,
            latex_post,
            sort_field,
            deck_id,
            requirements,
        } = self;

        let mut field_index = HashMap::with_capacity(fields.len());
        for (ord, field) in fields.iter_mut().enumerate() {
            if field.name.trim().is_empty() {
                return Err(AnkipackError::Shape(format!(
                    "note type '{name}': field {ord} has an empty name"
                )));
            }
            if field_index.insert(field.name.clone(), ord).is_some() {
                return Err(AnkipackError::Shape(format!(
                    "note type '{name}': duplicate field name '{}'",
                    field.name
                )));
            }
            field.ord = ord;
        }
        if !fields.is_empty() && sort_field >= fields.len() {
            return Err(AnkipackError::Shape(format!(
                "note type '{name}': sort field {sort_field} is out of range"
            )));
        }

        if kind == NoteTypeKind::Cloze {
            if requirements.is_some() {
                return Err(AnkipackError::Shape(format!(
                    "cloze note type '{name}' takes no requirement rules"
                )));
            }
            if templates.len() > 1 {
                return Err(AnkipackError::Shape(format!(
                    "cloze note type '{name}' takes one template, got {}",
                    templates.len()
                )));
            }
            if templates.is_empty() {
                templates.push(Template::new("", ""));
            }
        }
        for (ord, template) in templates.iter_mut().enumerate() {
            template.ord = ord;
            if template.name.is_empty() {
                template.name = match kind {
                    NoteTypeKind::Standard => format!("Card {}", ord + 1),
                    NoteTypeKind::Cloze => "Cloze".to_string(),
                };
            }
        }

        let (requirements, cloze_field_ords) = match kind {
            NoteTypeKind::Standard => {
                let rules = match requirements {
                    Some(rules) => {
                        validate_requirements(&name, &rules, templates.len(), fields.len())?;
                        rules
                    }
                    None => derive_requirements(&name, &fields, &templates)?,
                };
                (rules, Vec::new())
            }
            NoteTypeKind::Cloze => (Vec::new(), compile_cloze_fields(&name, &templates[0].qfmt, &field_index)),
        };

        let default_css = match kind {
            NoteTypeKind::Standard => DEFAULT_CSS,
            NoteTypeKind::Cloze => DEFAULT_CLOZE_CSS,
        };

        Ok(Arc::new(NoteType {
            id,
            name,
            kind,
            fields,
            templates,
            css: css.unwrap_or_else(|| default_css.to_string()),
            latex_pre: latex_pre.unwrap_or_else(|| DEFAULT_LATEX_PRE.to_string()),
            latex_post: latex_post.unwrap_or_else(|| DEFAULT_LATEX_POST.to_string()),
            sort_field,
            deck_id,
            requirements,
            cloze_field_ords,
            field_index,
        }))
    }
}

fn validate_requirements(
    name: &str,
    rules: &[Requirement],
    template_count: usize,
    field_count: usize,
) -> Result<()> {
    let mut seen = HashSet::new();
    for rule in rules {
        if rule.template_ord >= template_count {
            return Err(AnkipackError::Shape(format!(
                "note type '{name}': requirement names template {} but only {template_count} exist",
                rule.template_ord
            )));
        }
        if !seen.insert(rule.template_ord) {
            return Err(AnkipackError::Shape(format!(
                "note type '{name}': template {} has more than one requirement",
                rule.template_ord
            )));
        }
        if let Some(bad) = rule.field_ords.iter().find(|ord| **ord >= field_count) {
            return Err(AnkipackError::Shape(format!(
                "note type '{name}': requirement for template {} names field {bad} but only {field_count} exist",
                rule.template_ord
            )));
        }
    }
    Ok(())
}

fn derive_requirements(name: &str, fields: &[Field], templates: &[Template]) -> Result<Vec<Requirement>> {
    let field_names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    templates
        .iter()
        .map(|template| {
            requirements::derive_requirement(template.ord, &template.qfmt, &field_names).ok_or_else(|| {
                AnkipackError::Shape(format!(
                    "note type '{name}': template '{}' can never produce a card; check its question format",
                    template.name
                ))
            })
        })
        .collect()
}

/// Resolves the field names referenced by cloze directives in `qfmt`.
///
/// Unknown names are skipped; older decks reference fields that were renamed.
fn compile_cloze_fields(name: &str, qfmt: &str, field_index: &HashMap<String, usize>) -> Vec<usize> {
    let referenced = CLOZE_CURLY_RE
        .captures_iter(qfmt)
        .chain(CLOZE_PERCENT_RE.captures_iter(qfmt))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()));

    let mut ords = Vec::new();
    for field_name in referenced {
        match field_index.get(field_name) {
            Some(ord) if !ords.contains(ord) => ords.push(*ord),
            Some(_) => {}
            None => log::debug!("cloze note type '{name}' references unknown field '{field_name}'"),
        }
    }
    ords
}
