//! Identity codec for scanned QR payloads
//!
//! The card printer encodes each student as a small JSON object:
//! `{"nama": "...", "kelas": "...", "gender": "L"}`. Decoding is pure and
//! strict: any shape that does not yield a non-empty name, a non-empty
//! class, and a recognized gender letter is rejected before it can reach
//! the ledger.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Student gender
///
/// The printer emits the Indonesian letters `L` (laki-laki) / `P`
/// (perempuan); roster imports use `M` / `F`. Both are accepted on the
/// wire; the canonical serialized form is `M` / `F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M", alias = "L")]
    Male,
    #[serde(rename = "F", alias = "P")]
    Female,
}

impl Gender {
    /// Parse a gender letter; `None` for anything unrecognized
    pub fn from_letter(s: &str) -> Option<Self> {
        match s.trim() {
            "M" | "L" => Some(Gender::Male),
            "F" | "P" => Some(Gender::Female),
            _ => None,
        }
    }

    /// Canonical single-letter form
    pub fn as_letter(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_letter())
    }
}

/// Identity of one physical student, as printed on their QR card
///
/// Immutable once decoded; produced either by scanning or by roster lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentIdentity {
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "kelas")]
    pub class: String,
    pub gender: Gender,
}

/// Raw payload shape before validation
#[derive(Debug, Deserialize)]
struct RawPayload {
    nama: Option<String>,
    kelas: Option<String>,
    gender: Option<String>,
}

/// Decode a scanned payload into a [`StudentIdentity`]
///
/// Pure, no side effects. Returns [`Error::InvalidPayload`] for anything
/// that is not JSON, lacks a non-empty `nama` or `kelas`, or carries a
/// gender letter outside the accepted set. Gender is never inferred from
/// a missing field.
pub fn decode_payload(raw: &str) -> Result<StudentIdentity> {
    let payload: RawPayload = serde_json::from_str(raw)
        .map_err(|e| Error::InvalidPayload(format!("not a valid QR payload: {}", e)))?;

    let name = payload
        .nama
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidPayload("missing student name".to_string()))?;

    let class = payload
        .kelas
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidPayload("missing student class".to_string()))?;

    let gender = payload
        .gender
        .as_deref()
        .and_then(Gender::from_letter)
        .ok_or_else(|| Error::InvalidPayload("missing or unrecognized gender".to_string()))?;

    Ok(StudentIdentity {
        name: name.to_string(),
        class: class.to_string(),
        gender,
    })
}
