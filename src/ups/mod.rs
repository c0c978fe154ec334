//! UPS Street Level Address Validation (XAV) integration.
//!
//! [`AddressValidationClient`] turns an [`AddressQuery`] into the vendor's
//! SOAP request, performs the call, and classifies the reply into an
//! [`Outcome`]. [`field_candidates`] then projects the outcome down to one
//! address sub-field per candidate.

mod candidates;
mod client;
pub mod domain;
mod envelope;
mod response;

pub use candidates::field_candidates;
pub use client::AddressValidationClient;
pub use domain::{AddressQuery, CandidateAddress, FieldSelector, Outcome};

use std::fmt;
use std::path::PathBuf;

/// Failures of the validation pipeline.
///
/// "No candidates" is deliberately not represented here; it is a valid
/// [`Outcome`], not an error.
#[derive(Debug)]
pub enum ValidationError {
    /// The vendor interface definition required to perform the call is not
    /// where configuration says it is. Unrecoverable; the server refuses to
    /// start rather than attempt a degraded call.
    WsdlMissing { path: PathBuf },
    /// Field selector outside the accepted 0-3 range. Raised before any
    /// vendor call.
    InvalidSelector { value: i64 },
    /// The request envelope could not be serialized.
    Envelope(quick_xml::Error),
    /// The vendor call failed or returned a fault. Carries the vendor's
    /// primary error code when one was present in the fault detail.
    Transport {
        code: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::WsdlMissing { path } => {
                write!(f, "UPS WSDL is missing at '{}'", path.display())
            }
            ValidationError::InvalidSelector { .. } => {
                write!(
                    f,
                    "param 'type' is incorrect; possible values are: 0 - zip, 1 - state, 2 - city, 3 - address"
                )
            }
            ValidationError::Envelope(err) => write!(f, "request envelope error: {err}"),
            ValidationError::Transport {
                code: Some(code),
                message,
            } => write!(f, "UPS SOAP error: #{code} - {message}"),
            ValidationError::Transport {
                code: None,
                message,
            } => write!(f, "UPS transport error: {message}"),
        }
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ValidationError::Envelope(err) => Some(err),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for ValidationError {
    fn from(value: quick_xml::Error) -> Self {
        Self::Envelope(value)
    }
}
