use super::ValidationError;

/// A partial postal address as submitted by the caller.
///
/// Fields are free text and are forwarded to the vendor without any format
/// validation. A query is built once per validation call and not mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressQuery {
    pub country: String,
    pub postal_code: String,
    pub state_or_province: String,
    pub city: String,
    pub address_line: String,
}

impl AddressQuery {
    /// Query for the implicit "US" country used by the HTTP surface.
    pub fn us(postal_code: String, state_or_province: String, city: String, address_line: String) -> Self {
        Self {
            country: "US".to_string(),
            postal_code,
            state_or_province,
            city,
            address_line,
        }
    }
}

/// One normalized completion suggested by the vendor.
///
/// Only [`super::AddressValidationClient`] constructs these; downstream code
/// never builds a candidate from scratch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateAddress {
    pub postal_code_primary: String,
    pub state_or_province: String,
    pub city: String,
    pub address_lines: Vec<String>,
}

/// Which sub-field of each candidate the caller wants extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSelector {
    PostalCode,
    StateOrProvince,
    City,
    AddressLine,
}

impl FieldSelector {
    /// Maps the wire integer (0 - zip, 1 - state, 2 - city, 3 - address) to a
    /// selector. Anything outside that range is rejected here, before any
    /// vendor call is made.
    pub fn from_index(value: i64) -> Result<Self, ValidationError> {
        match value {
            0 => Ok(Self::PostalCode),
            1 => Ok(Self::StateOrProvince),
            2 => Ok(Self::City),
            3 => Ok(Self::AddressLine),
            _ => Err(ValidationError::InvalidSelector { value }),
        }
    }
}

/// Result of one validation call.
///
/// The vendor either declines to suggest anything (`NoCandidates`) or returns
/// at least one candidate; an empty `Candidates` vector never occurs. The two
/// cases must stay distinguishable for the HTTP layer to report "no results"
/// as a warning instead of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoCandidates,
    Candidates(Vec<CandidateAddress>),
}
