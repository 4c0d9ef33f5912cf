//! Triplet review table and upsert payload construction.
//!
//! The extraction and upsert services exchange triplets as
//! `[subject, object, predicate]`. Rows keep named fields and the wire order
//! is applied only at the boundaries.
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// One extraction result as returned by the triplet-extraction job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawExtraction {
    #[serde(default)]
    pub sentence: String,
    /// `[subject, object, predicate]`, entries may be missing or non-text.
    #[serde(default)]
    pub triplets: Vec<Vec<Value>>,
}

/// Sentence with its triplets in `[subject, object, predicate]` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub sentence: String,
    pub triplets: Vec<[String; 3]>,
}

/// Body of `POST /api/pipeline/upsert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertRequest {
    pub extractions: Vec<Extraction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl UpsertRequest {
    pub fn triplet_count(&self) -> usize {
        self.extractions.iter().map(|e| e.triplets.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripletField {
    Subject,
    Predicate,
    Object,
}

impl TripletField {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "subject" | "s" => Some(TripletField::Subject),
            "predicate" | "p" => Some(TripletField::Predicate),
            "object" | "o" => Some(TripletField::Object),
            _ => None,
        }
    }
}

pub type RowId = String;

/// Editable triplet row. `id` is fixed at creation from the extracted values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripletRow {
    pub id: RowId,
    pub sentence: String,
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub deleted: bool,
}

impl TripletRow {
    pub fn set_field(&mut self, field: TripletField, value: impl Into<String>) {
        let value = value.into();
        match field {
            TripletField::Subject => self.subject = value,
            TripletField::Predicate => self.predicate = value,
            TripletField::Object => self.object = value,
        }
    }

    fn is_complete(&self) -> bool {
        [&self.subject, &self.predicate, &self.object]
            .iter()
            .all(|v| !v.trim().is_empty())
    }
}

fn cell(triplet: &[Value], index: usize) -> Option<String> {
    let text = match triplet.get(index)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn row_id(sentence: &str, subject: &str, predicate: &str, object: &str, occurrence: usize) -> RowId {
    let mut hasher = Sha256::new();
    for part in [sentence, subject, predicate, object] {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    hasher.update(occurrence.to_le_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(12);
    for byte in digest.iter().take(6) {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

/// Normalizes extraction results into editable rows, dropping triplets that
/// lack a subject, predicate or object.
pub fn rows_from_extractions(results: &[RawExtraction]) -> Vec<TripletRow> {
    let mut occurrences: HashMap<(String, String, String, String), usize> = HashMap::new();
    let mut rows = Vec::new();
    for result in results {
        let sentence = result.sentence.trim();
        for triplet in &result.triplets {
            let (Some(subject), Some(object), Some(predicate)) =
                (cell(triplet, 0), cell(triplet, 1), cell(triplet, 2))
            else {
                continue;
            };
            let occurrence = occurrences
                .entry((
                    sentence.to_string(),
                    subject.clone(),
                    predicate.clone(),
                    object.clone(),
                ))
                .or_insert(0);
            *occurrence += 1;
            rows.push(TripletRow {
                id: row_id(sentence, &subject, &predicate, &object, *occurrence),
                sentence: sentence.to_string(),
                subject,
                predicate,
                object,
                deleted: false,
            });
        }
    }
    rows
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    NoTriplets,
}

/// Builds the upsert body from the surviving rows: deleted and incomplete
/// rows are skipped, rows are grouped by sentence in first-seen order and
/// exact duplicates within a sentence are collapsed.
pub fn build_upsert_request(
    rows: &[TripletRow],
    source: Option<&str>,
) -> Result<UpsertRequest, PayloadError> {
    let mut extractions: Vec<Extraction> = Vec::new();
    let mut by_sentence: HashMap<&str, usize> = HashMap::new();
    let mut seen: HashSet<(&str, &str, &str, &str)> = HashSet::new();

    for row in rows.iter().filter(|row| !row.deleted && row.is_complete()) {
        let (subject, predicate, object) =
            (row.subject.trim(), row.predicate.trim(), row.object.trim());
        if !seen.insert((row.sentence.as_str(), subject, predicate, object)) {
            continue;
        }
        let index = *by_sentence.entry(row.sentence.as_str()).or_insert_with(|| {
            extractions.push(Extraction {
                sentence: row.sentence.clone(),
                triplets: Vec::new(),
            });
            extractions.len() - 1
        });
        extractions[index].triplets.push([
            subject.to_string(),
            object.to_string(),
            predicate.to_string(),
        ]);
    }

    if extractions.is_empty() {
        return Err(PayloadError::NoTriplets);
    }
    Ok(UpsertRequest {
        extractions,
        source: source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned),
    })
}
