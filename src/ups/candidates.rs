use super::domain::{FieldSelector, Outcome};

/// Projects a validation outcome down to one sub-field per candidate.
///
/// Order follows the vendor's candidate order. `NoCandidates` yields an
/// empty vector so callers can report "no results" without treating it as a
/// failure. Candidates with several address lines collapse to a single
/// comma-joined line, matching the vendor's multi-line artifact.
pub fn field_candidates(outcome: &Outcome, selector: FieldSelector) -> Vec<String> {
    let candidates = match outcome {
        Outcome::NoCandidates => return Vec::new(),
        Outcome::Candidates(candidates) => candidates,
    };

    candidates
        .iter()
        .map(|candidate| match selector {
            FieldSelector::PostalCode => candidate.postal_code_primary.clone(),
            FieldSelector::StateOrProvince => candidate.state_or_province.clone(),
            FieldSelector::City => candidate.city.clone(),
            FieldSelector::AddressLine => candidate.address_lines.join(", "),
        })
        .collect()
}
