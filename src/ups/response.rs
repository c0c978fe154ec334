use super::domain::CandidateAddress;
use super::ValidationError;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Vendor fault detail, taken from `Errors/ErrorDetail/PrimaryErrorCode`
/// inside the SOAP fault, with `faultstring` as a fallback description.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct FaultDetail {
    pub(crate) code: Option<String>,
    pub(crate) description: Option<String>,
}

/// Raw classification of a ProcessXAV reply before the client maps it onto
/// an [`super::Outcome`].
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ParsedResponse {
    pub(crate) no_candidates: bool,
    pub(crate) candidates: Vec<CandidateAddress>,
    pub(crate) fault: Option<FaultDetail>,
}

/// Walks the reply envelope and collects candidates, the no-candidates
/// indicator, and any SOAP fault.
///
/// The wire format repeats a `Candidate` element per suggestion, so a
/// single-suggestion reply and a multi-suggestion reply accumulate through
/// the same path and come out as the same vector shape.
pub(crate) fn parse_xav_response(xml: &str) -> Result<ParsedResponse, ValidationError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut parsed = ParsedResponse::default();
    let mut fault = FaultDetail::default();
    let mut in_fault = false;
    let mut current: Option<CandidateAddress> = None;
    // Stack of local element names from the root down to the cursor.
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = local_name(start.local_name().as_ref());
                if name == "Fault" {
                    in_fault = true;
                }
                if name == "Candidate" {
                    current = Some(CandidateAddress::default());
                }
                if name == "NoCandidatesIndicator" {
                    parsed.no_candidates = true;
                }
                path.push(name);
            }
            Event::Empty(empty) => {
                if local_name(empty.local_name().as_ref()) == "NoCandidatesIndicator" {
                    parsed.no_candidates = true;
                }
            }
            Event::Text(text) => {
                let value = text.unescape()?.into_owned();
                if in_fault {
                    record_fault_field(&path, value, &mut fault);
                } else if let Some(candidate) = current.as_mut() {
                    record_candidate_field(&path, value, candidate);
                }
            }
            Event::End(end) => {
                let name = local_name(end.local_name().as_ref());
                if name == "Fault" {
                    in_fault = false;
                    parsed.fault = Some(fault.clone());
                }
                if name == "Candidate" {
                    if let Some(candidate) = current.take() {
                        parsed.candidates.push(candidate);
                    }
                }
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parsed)
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn path_ends_with(path: &[String], suffix: &[&str]) -> bool {
    path.len() >= suffix.len()
        && path
            .iter()
            .rev()
            .zip(suffix.iter().rev())
            .all(|(seen, expected)| seen == expected)
}

fn record_candidate_field(path: &[String], value: String, candidate: &mut CandidateAddress) {
    if path_ends_with(path, &["Candidate", "AddressKeyFormat", "AddressLine"]) {
        candidate.address_lines.push(value);
    } else if path_ends_with(path, &["Candidate", "AddressKeyFormat", "PoliticalDivision1"]) {
        candidate.state_or_province = value;
    } else if path_ends_with(path, &["Candidate", "AddressKeyFormat", "PoliticalDivision2"]) {
        candidate.city = value;
    } else if path_ends_with(path, &["Candidate", "AddressKeyFormat", "PostcodePrimaryLow"]) {
        candidate.postal_code_primary = value;
    }
}

fn record_fault_field(path: &[String], value: String, fault: &mut FaultDetail) {
    if path_ends_with(path, &["PrimaryErrorCode", "Code"]) {
        fault.code = Some(value);
    } else if path_ends_with(path, &["PrimaryErrorCode", "Description"]) {
        fault.description = Some(value);
    } else if path_ends_with(path, &["Fault", "faultstring"]) && fault.description.is_none() {
        fault.description = Some(value);
    }
}
