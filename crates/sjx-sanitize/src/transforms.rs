//! Sanitization transforms
//!
//! Each [`TransformKind`] turns one sensitive scalar into a plausible but
//! unrelated replacement. Transforms only generate candidates; the
//! [`Redactor`](crate::Redactor) decides on memoization and rejects
//! candidates that leak the original.

use crate::error::SanitizeError;
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const FIRST_NAMES: &[&str] = &[
    "Avery", "Blair", "Casey", "Dana", "Emerson", "Finley", "Harper", "Jordan", "Kendall",
    "Logan", "Morgan", "Parker", "Quinn", "Reese", "Rowan", "Sawyer", "Taylor", "Wren",
];

const LAST_NAMES: &[&str] = &[
    "Abbott", "Barlow", "Castillo", "Delgado", "Ellison", "Fairbanks", "Garrison", "Holloway",
    "Iverson", "Jennings", "Kowalski", "Lindqvist", "Mercado", "Nakamura", "Okafor", "Pruitt",
];

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Originals shorter than this get a same-length replacement from transforms
/// whose output carries dictionary or fixed text
pub const SHORT_VALUE_CHARS: usize = 3;

/// The transform applied to a sensitive field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    /// Keyed-hash pseudonym, `{field}_{hex}`
    Pseudonymize,
    /// Random first, last or full name depending on the field
    RandomName,
    /// Random address at `example.com`
    RandomEmail,
    /// SSN in the never-issued `000` area, keeping dashes
    InvalidSsn,
    /// Random digits of the original length
    FileNumber,
    /// Random letters and digits in the original's character classes
    MixupCssId,
    /// Original date shifted by 1 to 30 days either way
    SimilarDate,
    /// Every letter and digit replaced, spacing and punctuation kept
    ObfuscateSentence,
    /// Random digits, at least four
    RandomPin,
    /// Random digits of the original length
    RandomDigits,
}

impl TransformKind {
    /// Snake-case name, as used in configuration and errors
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Pseudonymize => "pseudonymize",
            Self::RandomName => "random_name",
            Self::RandomEmail => "random_email",
            Self::InvalidSsn => "invalid_ssn",
            Self::FileNumber => "file_number",
            Self::MixupCssId => "mixup_css_id",
            Self::SimilarDate => "similar_date",
            Self::ObfuscateSentence => "obfuscate_sentence",
            Self::RandomPin => "random_pin",
            Self::RandomDigits => "random_digits",
        }
    }

    /// Whether output includes name lists, field names or fixed digits that a
    /// one- or two-character original could appear in
    fn emits_fixed_text(self) -> bool {
        matches!(
            self,
            Self::Pseudonymize | Self::RandomName | Self::RandomEmail | Self::InvalidSsn
        )
    }

    /// Pick a transform from the field name
    #[must_use]
    pub fn for_field(field: &str) -> Self {
        if field == "ssn" || field.ends_with("_ssn") {
            Self::InvalidSsn
        } else if field.ends_with("file_number") {
            Self::FileNumber
        } else if field.ends_with("name") {
            Self::RandomName
        } else if field.contains("email") {
            Self::RandomEmail
        } else if field == "css_id" {
            Self::MixupCssId
        } else if field.contains("date") {
            Self::SimilarDate
        } else if field.ends_with("pin") || field.contains("_pin_") {
            Self::RandomPin
        } else if field.ends_with("_id") {
            Self::RandomDigits
        } else if ["notes", "text", "description", "instructions", "summary", "witness"]
            .iter()
            .any(|suffix| field.ends_with(suffix))
            || field == "military_service"
            || field == "bva_poc"
        {
            Self::ObfuscateSentence
        } else {
            Self::Pseudonymize
        }
    }
}

/// Candidate generator shared by all transforms of one run
#[derive(Debug)]
pub struct Transformer {
    rng: StdRng,
    key: [u8; 32],
}

impl Transformer {
    /// Create generator; a seed makes the run reproducible
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let key = rng.gen::<[u8; 32]>();
        Self { rng, key }
    }

    /// Generate a replacement for a string value
    ///
    /// `attempt` varies otherwise-deterministic transforms on retries.
    ///
    /// # Errors
    /// Returns [`SanitizeError::InvalidValue`] when the value cannot be parsed
    /// by the transform (e.g. a malformed date)
    pub fn apply_str(
        &mut self,
        kind: TransformKind,
        field: &str,
        value: &str,
        attempt: u32,
    ) -> Result<String, SanitizeError> {
        if kind.emits_fixed_text() && value.chars().count() < SHORT_VALUE_CHARS {
            return Ok(self.initials(value));
        }
        Ok(match kind {
            TransformKind::Pseudonymize => self.pseudonym(field, value, attempt),
            TransformKind::RandomName => self.random_name(field),
            TransformKind::RandomEmail => self.random_email(),
            TransformKind::InvalidSsn => self.invalid_ssn(value),
            TransformKind::FileNumber | TransformKind::RandomDigits => {
                self.digits(value.chars().count().max(1))
            }
            TransformKind::MixupCssId => self.mixup(value),
            TransformKind::SimilarDate => self.similar_date(field, value)?,
            TransformKind::ObfuscateSentence => self.obfuscate(value),
            TransformKind::RandomPin => self.digits(value.chars().count().max(4)),
        })
    }

    /// Generate a replacement for an integer value with the same digit count
    pub fn apply_int(&mut self, value: i64) -> i64 {
        let width = value.unsigned_abs().to_string().len().min(18);
        let low = 10_i64.pow(u32::try_from(width - 1).unwrap_or(0));
        let high = 10_i64.pow(u32::try_from(width).unwrap_or(1));
        let candidate = self.rng.gen_range(low.max(1)..high);
        if value < 0 {
            -candidate
        } else {
            candidate
        }
    }

    fn pseudonym(&self, field: &str, value: &str, attempt: u32) -> String {
        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        hasher.update(field.as_bytes());
        hasher.update(&[0]);
        hasher.update(value.as_bytes());
        hasher.update(&attempt.to_le_bytes());
        let hash = hasher.finalize();
        format!("{field}_{}", hex::encode(&hash.as_bytes()[..6]))
    }

    fn pick(&mut self, names: &[&'static str]) -> &'static str {
        names.choose(&mut self.rng).copied().unwrap_or("Redacted")
    }

    fn random_name(&mut self, field: &str) -> String {
        match field {
            "first_name" | "middle_name" => self.pick(FIRST_NAMES).to_string(),
            "last_name" => self.pick(LAST_NAMES).to_string(),
            _ => {
                let first = self.pick(FIRST_NAMES);
                let last = self.pick(LAST_NAMES);
                format!("{first} {last}")
            }
        }
    }

    fn random_email(&mut self) -> String {
        let first = self.pick(FIRST_NAMES).to_lowercase();
        let last = self.pick(LAST_NAMES).to_lowercase();
        let n: u16 = self.rng.gen_range(10..1000);
        format!("{first}.{last}{n}@example.com")
    }

    fn digits(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| char::from(b'0' + self.rng.gen_range(0..10)))
            .collect()
    }

    fn invalid_ssn(&mut self, value: &str) -> String {
        let group = self.digits(2);
        let serial = self.digits(4);
        if value.contains('-') {
            format!("000-{group}-{serial}")
        } else {
            format!("000{group}{serial}")
        }
    }

    fn mixup(&mut self, value: &str) -> String {
        value
            .chars()
            .map(|c| self.replace_char(c))
            .collect()
    }

    fn replace_char(&mut self, c: char) -> char {
        if c.is_ascii_digit() {
            char::from(b'0' + self.rng.gen_range(0..10))
        } else if c.is_ascii_alphabetic() {
            let letter = char::from(LETTERS[self.rng.gen_range(0..LETTERS.len())]);
            if c.is_ascii_uppercase() {
                letter.to_ascii_uppercase()
            } else {
                letter
            }
        } else if c.is_alphanumeric() {
            // Non-ASCII letters would otherwise survive redaction verbatim.
            'x'
        } else {
            c
        }
    }

    /// Random letter or digit per character, keeping digits and case
    fn initials(&mut self, value: &str) -> String {
        value
            .chars()
            .map(|c| {
                if c.is_ascii_digit() {
                    char::from(b'0' + self.rng.gen_range(0..10))
                } else {
                    let letter = char::from(LETTERS[self.rng.gen_range(0..LETTERS.len())]);
                    if c.is_uppercase() {
                        letter.to_ascii_uppercase()
                    } else {
                        letter
                    }
                }
            })
            .collect()
    }

    fn obfuscate(&mut self, value: &str) -> String {
        self.mixup(value)
    }

    fn shift_days(&mut self) -> i64 {
        let days = self.rng.gen_range(1..=30);
        if self.rng.gen_bool(0.5) {
            days
        } else {
            -days
        }
    }

    fn similar_date(&mut self, field: &str, value: &str) -> Result<String, SanitizeError> {
        let shift = Duration::days(self.shift_days());
        if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return date
                .checked_add_signed(shift)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .ok_or_else(|| invalid_date(field, "date out of range"));
        }
        if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
            return datetime
                .checked_add_signed(shift)
                .map(|d| d.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                .ok_or_else(|| invalid_date(field, "timestamp out of range"));
        }
        Err(invalid_date(field, &format!("'{value}' is not a date")))
    }
}

fn invalid_date(field: &str, message: &str) -> SanitizeError {
    SanitizeError::InvalidValue {
        field: field.to_string(),
        transform: TransformKind::SimilarDate.name(),
        message: message.to_string(),
    }
}
