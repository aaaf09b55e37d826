//! Core domain types for the Mint lifestyle tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Cycle and symptom records as stored by the host application
//! - The cycle history snapshot handed to the engine
//! - Derived values (predictions, phases, calendar cells)
//! - Ledger transactions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Recorded Data
// ============================================================================

/// Flow intensity of a recorded period
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlowIntensity {
    Light,
    #[default]
    Normal,
    Heavy,
    VeryHeavy,
}

impl FlowIntensity {
    /// Parse the storage tag (`light`, `normal`, `heavy`, `very_heavy`)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "light" => Some(Self::Light),
            "normal" => Some(Self::Normal),
            "heavy" => Some(Self::Heavy),
            "very_heavy" | "very-heavy" => Some(Self::VeryHeavy),
            _ => None,
        }
    }
}

/// One recorded period, from its first to its last day of flow
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CycleRecord {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub flow: FlowIntensity,
    #[serde(default)]
    pub note: String,
}

impl CycleRecord {
    /// Create a record with a fresh id
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, flow: FlowIntensity) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_date,
            end_date,
            flow,
            note: String::new(),
        }
    }

    /// Attach a free-text note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Number of flow days, counting both start and end
    pub fn flow_length(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Whether `date` falls within `[start_date, end_date]`
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Daily mood as captured by the symptom form
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    VeryHappy,
    Happy,
    Normal,
    Sad,
    VerySad,
    /// Anything the host sends that is not one of the fixed moods
    #[serde(untagged)]
    Other(String),
}

impl Mood {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "very_happy" => Self::VeryHappy,
            "happy" => Self::Happy,
            "normal" => Self::Normal,
            "sad" => Self::Sad,
            "very_sad" => Self::VerySad,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Symptom tags offered by the symptom form
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SymptomTag {
    Cramps,
    Headache,
    Bloating,
    Fatigue,
    MoodSwings,
    Acne,
    BreastTenderness,
    BackPain,
    Nausea,
    #[serde(untagged)]
    Other(String),
}

impl SymptomTag {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "cramps" => Self::Cramps,
            "headache" => Self::Headache,
            "bloating" => Self::Bloating,
            "fatigue" => Self::Fatigue,
            "mood_swings" => Self::MoodSwings,
            "acne" => Self::Acne,
            "breast_tenderness" => Self::BreastTenderness,
            "back_pain" => Self::BackPain,
            "nausea" => Self::Nausea,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Symptoms logged for a single calendar date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SymptomRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    pub mood: Option<Mood>,
    #[serde(default)]
    pub symptoms: Vec<SymptomTag>,
    #[serde(default)]
    pub note: String,
}

impl SymptomRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            mood: None,
            symptoms: Vec::new(),
            note: String::new(),
        }
    }
}

/// Everything the engine knows about a user's cycles
///
/// `average_cycle_length` and `average_flow_length` are cached values that
/// only change when a record is committed or removed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CycleHistory {
    /// Newest first, by insertion
    #[serde(default)]
    pub records: Vec<CycleRecord>,
    #[serde(default)]
    pub symptoms: Vec<SymptomRecord>,
    pub last_start_date: Option<NaiveDate>,
    pub average_cycle_length: i64,
    pub average_flow_length: i64,
}

// ============================================================================
// Derived Values
// ============================================================================

/// The four mutually exclusive cycle phases
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Menstrual => "menstrual",
            Phase::Follicular => "follicular",
            Phase::Ovulation => "ovulation",
            Phase::Luteal => "luteal",
        }
    }

    /// Short advice line shown next to the phase
    pub fn description(&self) -> &'static str {
        match self {
            Phase::Menstrual => "Menstrual phase - rest and keep warm",
            Phase::Follicular => "Follicular phase - high energy, good time to exercise",
            Phase::Ovulation => "Ovulation phase - fertile window, take precautions",
            Phase::Luteal => "Luteal phase - mood swings are common, go easy on yourself",
        }
    }
}

/// Forward-looking prediction derived from a history and a reference date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub next_start_date: NaiveDate,
    pub ovulation_date: NaiveDate,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
    pub days_until_next: i64,
    pub current_cycle_day: i64,
    pub current_phase: Phase,
}

/// The single visual marker a calendar cell carries
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseClass {
    None,
    Today,
    Menstrual,
    Ovulation,
    PredictedMenstrual,
    Fertile,
}

impl PhaseClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseClass::None => "none",
            PhaseClass::Today => "today",
            PhaseClass::Menstrual => "menstrual",
            PhaseClass::Ovulation => "ovulation",
            PhaseClass::PredictedMenstrual => "predicted-menstrual",
            PhaseClass::Fertile => "fertile",
        }
    }
}

/// One cell of a 6x7 month grid
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CalendarCell {
    pub day_number: u32,
    pub iso_date: String,
    pub belongs_to_displayed_month: bool,
    pub is_today: bool,
    pub phase_class: PhaseClass,
}

/// Averages written back to the history after a commit
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RollingAverages {
    pub cycle_length: i64,
    pub flow_length: i64,
}

/// Summary panel numbers for the period page
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CycleStats {
    pub total_records: usize,
    pub average_cycle_length: i64,
    pub average_flow_length: i64,
    pub shortest_cycle: Option<i64>,
    pub longest_cycle: Option<i64>,
    pub last_period_start: Option<NaiveDate>,
    pub last_period_end: Option<NaiveDate>,
}

// ============================================================================
// Ledger Types
// ============================================================================

/// Direction of money movement
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// A single ledger entry. Amounts are integer cents.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount_cents: i64,
    pub category: String,
    #[serde(default)]
    pub note: String,
    pub date: NaiveDate,
}

/// A ledger category from the built-in catalog
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: TransactionKind,
    pub color: &'static str,
}
