//! Default collection configuration and deck options.
//!
//! These mirror the values a freshly created Anki collection carries. Every
//! [`Package`](crate::Package) owns its own copies, so callers can override
//! any value without affecting other packages.

use serde::{Deserialize, Serialize};

/// New cards are mixed with reviews.
pub const NEW_CARDS_DISTRIBUTE: i64 = 0;
/// New cards are shown after reviews.
pub const NEW_CARDS_LAST: i64 = 1;
/// New cards are shown before reviews.
pub const NEW_CARDS_FIRST: i64 = 2;

/// New cards are introduced in random order.
pub const NEW_CARDS_RANDOM: i64 = 0;
/// New cards are introduced in the order they were added.
pub const NEW_CARDS_DUE: i64 = 1;

/// Starting ease factor, in permille.
pub const STARTING_FACTOR: i64 = 2500;

/// Id of the single options group written to `dconf`.
pub const DEFAULT_DECK_CONFIG_ID: i64 = 1;

/// Collection-wide settings stored in the `col.conf` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    pub active_decks: Vec<i64>,
    pub cur_deck: i64,
    pub new_spread: i64,
    pub collapse_time: i64,
    pub time_lim: i64,
    pub est_times: bool,
    pub due_counts: bool,
    pub cur_model: Option<String>,
    pub next_pos: i64,
    pub sort_type: String,
    pub sort_backwards: bool,
    /// Whether added notes go to the currently selected deck.
    pub add_to_cur: bool,
    pub day_learn_first: bool,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            active_decks: vec![1],
            cur_deck: 1,
            new_spread: NEW_CARDS_DISTRIBUTE,
            collapse_time: 1200,
            time_lim: 0,
            est_times: true,
            due_counts: true,
            cur_model: None,
            next_pos: 1,
            sort_type: "noteFld".to_string(),
            sort_backwards: false,
            add_to_cur: true,
            day_learn_first: false,
        }
    }
}

/// Options for new cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCardOptions {
    /// Learning steps, in minutes.
    pub delays: Vec<f64>,
    pub ints: Vec<i64>,
    pub initial_factor: i64,
    pub separate: bool,
    pub order: i64,
    pub per_day: i64,
    pub bury: bool,
}

impl Default for NewCardOptions {
    fn default() -> Self {
        Self {
            delays: vec![1.0, 10.0],
            ints: vec![1, 4, 7],
            initial_factor: STARTING_FACTOR,
            separate: true,
            order: NEW_CARDS_DUE,
            per_day: 20,
            bury: false,
        }
    }
}

/// Options for lapsed cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapseOptions {
    pub delays: Vec<f64>,
    pub mult: f64,
    pub min_int: i64,
    pub leech_fails: i64,
    /// 0 suspends leeches, 1 only tags them.
    pub leech_action: i64,
}

impl Default for LapseOptions {
    fn default() -> Self {
        Self {
            delays: vec![10.0],
            mult: 0.0,
            min_int: 1,
            leech_fails: 8,
            leech_action: 0,
        }
    }
}

/// Options for review cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOptions {
    pub per_day: i64,
    pub ease4: f64,
    pub fuzz: f64,
    pub min_space: i64,
    pub ivl_fct: f64,
    pub max_ivl: i64,
    pub bury: bool,
    pub hard_factor: f64,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            per_day: 200,
            ease4: 1.3,
            fuzz: 0.05,
            min_space: 1,
            ivl_fct: 1.0,
            max_ivl: 36500,
            bury: false,
            hard_factor: 1.2,
        }
    }
}

/// One options group in the `col.dconf` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckConfig {
    pub id: i64,
    pub name: String,
    pub new: NewCardOptions,
    pub lapse: LapseOptions,
    pub rev: ReviewOptions,
    pub max_taken: i64,
    pub timer: i64,
    pub autoplay: bool,
    pub replayq: bool,
    #[serde(rename = "mod")]
    pub modified: i64,
    pub usn: i64,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_DECK_CONFIG_ID,
            name: "Default".to_string(),
            new: NewCardOptions::default(),
            lapse: LapseOptions::default(),
            rev: ReviewOptions::default(),
            max_taken: 60,
            timer: 0,
            autoplay: true,
            replayq: true,
            modified: 0,
            usn: 0,
        }
    }
}

/// One entry of the `col.decks` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckRecord {
    pub id: i64,
    pub name: String,
    pub desc: String,
    /// `[day, count]` pairs for today's study counters.
    pub new_today: [i64; 2],
    pub rev_today: [i64; 2],
    pub lrn_today: [i64; 2],
    pub time_today: [i64; 2],
    pub conf: i64,
    pub usn: i64,
    /// 1 for filtered decks; anki stores it as an integer flag.
    #[serde(rename = "dyn")]
    pub dynamic: i64,
    pub collapsed: bool,
    pub extend_new: i64,
    pub extend_rev: i64,
}

impl DeckRecord {
    pub fn new(id: i64, name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            desc: desc.into(),
            new_today: [0, 0],
            rev_today: [0, 0],
            lrn_today: [0, 0],
            time_today: [0, 0],
            conf: DEFAULT_DECK_CONFIG_ID,
            usn: 0,
            dynamic: 0,
            collapsed: false,
            extend_new: 10,
            extend_rev: 50,
        }
    }
}
