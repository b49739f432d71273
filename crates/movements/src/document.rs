//! Human-readable document identifiers.
//!
//! Shape: `PREFIX/LOCATION/YY/NNNNN` with an optional `-SUFFIX` marker, e.g.
//! `TRF/W1/26/00042` for a transfer's debit leg and `TRF/W1/26/00042-IN` for
//! its credit leg. The stem (`PREFIX/LOCATION/YY/`) resets naturally every
//! calendar year because `YY` changes.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use stockledger_core::{LedgerError, LocationCode};

/// Marker appended to a transfer credit leg's document id so the two legs of
/// one transfer can be correlated after the fact.
pub const CREDIT_LEG_SUFFIX: &str = "IN";

/// The kind of a movement record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Inbound,
    Outbound,
    Transfer,
}

impl MovementKind {
    /// Fixed three-letter document-id prefix for this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            MovementKind::Inbound => "GRN",
            MovementKind::Outbound => "GIN",
            MovementKind::Transfer => "TRF",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "GRN" => Some(MovementKind::Inbound),
            "GIN" => Some(MovementKind::Outbound),
            "TRF" => Some(MovementKind::Transfer),
            _ => None,
        }
    }
}

/// A parsed document id.
///
/// Serialized as its string form; deserialization re-validates the format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId {
    kind: MovementKind,
    location: LocationCode,
    year: u8,
    sequence: u32,
    suffix: Option<String>,
}

impl DocumentId {
    pub fn new(kind: MovementKind, location: LocationCode, year: i32, sequence: u32) -> Self {
        Self {
            kind,
            location,
            year: (year.rem_euclid(100)) as u8,
            sequence,
            suffix: None,
        }
    }

    /// The same id with a suffix marker attached (e.g. a credit leg).
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            suffix: Some(suffix.to_string()),
            ..self.clone()
        }
    }

    /// The credit-leg counterpart of this id.
    pub fn credit_leg(&self) -> Self {
        self.with_suffix(CREDIT_LEG_SUFFIX)
    }

    pub fn is_credit_leg(&self) -> bool {
        self.suffix.as_deref() == Some(CREDIT_LEG_SUFFIX)
    }

    pub fn kind(&self) -> MovementKind {
        self.kind
    }

    pub fn location(&self) -> &LocationCode {
        &self.location
    }

    pub fn year(&self) -> u8 {
        self.year
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// `PREFIX/LOCATION/YY/` — the part shared by every id in one
    /// (kind, location, year) scope.
    pub fn stem(&self) -> String {
        format!("{}/{}/{:02}/", self.kind.prefix(), self.location, self.year)
    }

    /// The id without any suffix marker (both transfer legs share a body).
    pub fn body(&self) -> String {
        format!("{}{:05}", self.stem(), self.sequence)
    }
}

impl core::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.body())?;
        if let Some(suffix) = &self.suffix {
            write!(f, "-{suffix}")?;
        }
        Ok(())
    }
}

impl FromStr for DocumentId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || LedgerError::validation(format!("malformed document id '{s}'"));

        let mut parts = s.split('/');
        let prefix = parts.next().ok_or_else(malformed)?;
        let location = parts.next().ok_or_else(malformed)?;
        let year = parts.next().ok_or_else(malformed)?;
        let tail = parts.next().ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }

        let kind = MovementKind::from_prefix(prefix).ok_or_else(malformed)?;
        let location = LocationCode::new(location).map_err(|_| malformed())?;

        if year.len() != 2 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let year: u8 = year.parse().map_err(|_| malformed())?;

        let (digits, suffix) = match tail.split_once('-') {
            Some((d, sfx)) => (d, Some(sfx)),
            None => (tail, None),
        };
        if digits.len() != 5 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let sequence: u32 = digits.parse().map_err(|_| malformed())?;

        let suffix = match suffix {
            Some(sfx) => {
                if sfx.is_empty() || !sfx.bytes().all(|b| b.is_ascii_uppercase()) {
                    return Err(malformed());
                }
                Some(sfx.to_string())
            }
            None => None,
        };

        Ok(Self {
            kind,
            location,
            year,
            sequence,
            suffix,
        })
    }
}

impl TryFrom<String> for DocumentId {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DocumentId> for String {
    fn from(value: DocumentId) -> Self {
        value.to_string()
    }
}
