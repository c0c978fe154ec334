use super::domain::AddressQuery;
use super::ValidationError;
use crate::config::UpsConfig;
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

const SOAP_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SECURITY_NS: &str = "http://www.ups.com/XMLSchema/XOLTWS/UPSS/v1.0";
const XAV_NS: &str = "http://www.ups.com/XMLSchema/XOLTWS/xav/v1.0";
const COMMON_NS: &str = "http://www.ups.com/XMLSchema/XOLTWS/Common/v1.0";

/// RequestOption "1" selects plain address validation (no classification).
const REQUEST_OPTION_ADDRESS_VALIDATION: &str = "1";
const MAXIMUM_CANDIDATE_LIST_SIZE: &str = "10";

/// Serializes the ProcessXAV request envelope.
///
/// Credentials travel as a `UPSSecurity` SOAP header and are rebuilt from
/// the configuration on every call; the vendor rejects stale security
/// headers reused across requests on one connection.
pub(crate) fn build_xav_request(
    config: &UpsConfig,
    query: &AddressQuery,
) -> Result<String, ValidationError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer
        .create_element("soapenv:Envelope")
        .with_attributes([
            ("xmlns:soapenv", SOAP_NS),
            ("xmlns:upss", SECURITY_NS),
            ("xmlns:xav", XAV_NS),
            ("xmlns:common", COMMON_NS),
        ])
        .write_inner_content(|envelope| -> Result<(), quick_xml::Error> {
            envelope
                .create_element("soapenv:Header")
                .write_inner_content(|header| -> Result<(), quick_xml::Error> {
                    write_security_header(header, config)
                })?;
            envelope
                .create_element("soapenv:Body")
                .write_inner_content(|body| -> Result<(), quick_xml::Error> {
                    write_xav_body(body, query)
                })?;
            Ok(())
        })?;

    // The writer only ever receives &str input, so the buffer is valid UTF-8.
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_security_header<W: Write>(
    writer: &mut Writer<W>,
    config: &UpsConfig,
) -> Result<(), quick_xml::Error> {
    writer
        .create_element("upss:UPSSecurity")
        .write_inner_content(|security| -> Result<(), quick_xml::Error> {
            security
                .create_element("upss:UsernameToken")
                .write_inner_content(|token| -> Result<(), quick_xml::Error> {
                    leaf(token, "upss:Username", &config.username)?;
                    leaf(token, "upss:Password", &config.password)?;
                    Ok(())
                })?;
            security
                .create_element("upss:ServiceAccessToken")
                .write_inner_content(|token| -> Result<(), quick_xml::Error> {
                    leaf(token, "upss:AccessLicenseNumber", &config.license_number)
                })?;
            Ok(())
        })?;
    Ok(())
}

fn write_xav_body<W: Write>(
    writer: &mut Writer<W>,
    query: &AddressQuery,
) -> Result<(), quick_xml::Error> {
    writer
        .create_element("xav:XAVRequest")
        .write_inner_content(|request| -> Result<(), quick_xml::Error> {
            request
                .create_element("common:Request")
                .write_inner_content(|options| -> Result<(), quick_xml::Error> {
                    leaf(
                        options,
                        "common:RequestOption",
                        REQUEST_OPTION_ADDRESS_VALIDATION,
                    )
                })?;
            leaf(
                request,
                "xav:MaximumCandidateListSize",
                MAXIMUM_CANDIDATE_LIST_SIZE,
            )?;
            request
                .create_element("xav:AddressKeyFormat")
                .write_inner_content(|address| -> Result<(), quick_xml::Error> {
                    leaf(address, "xav:AddressLine", &query.address_line)?;
                    leaf(address, "xav:PoliticalDivision2", &query.city)?;
                    leaf(address, "xav:PoliticalDivision1", &query.state_or_province)?;
                    leaf(address, "xav:PostcodePrimaryLow", &query.postal_code)?;
                    leaf(address, "xav:CountryCode", &query.country)?;
                    Ok(())
                })?;
            Ok(())
        })?;
    Ok(())
}

fn leaf<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), quick_xml::Error> {
    writer
        .create_element(name)
        .write_text_content(BytesText::new(value))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpsConfig;

    fn sample_config() -> UpsConfig {
        UpsConfig {
            test_mode: true,
            username: "shipper".to_string(),
            password: "hunter2".to_string(),
            license_number: "ABC123".to_string(),
            wsdl_path: "wsdl/XAV.wsdl".into(),
            endpoint_override: None,
        }
    }

    fn sample_query() -> AddressQuery {
        AddressQuery::us(
            "21236".to_string(),
            "MD".to_string(),
            "Baltimore".to_string(),
            "Mark".to_string(),
        )
    }

    #[test]
    fn envelope_carries_credentials_in_security_header() {
        let xml = build_xav_request(&sample_config(), &sample_query()).expect("envelope builds");

        assert!(xml.contains("<upss:Username>shipper</upss:Username>"));
        assert!(xml.contains("<upss:Password>hunter2</upss:Password>"));
        assert!(xml.contains("<upss:AccessLicenseNumber>ABC123</upss:AccessLicenseNumber>"));
    }

    #[test]
    fn envelope_uses_fixed_request_options() {
        let xml = build_xav_request(&sample_config(), &sample_query()).expect("envelope builds");

        assert!(xml.contains("<common:RequestOption>1</common:RequestOption>"));
        assert!(xml.contains("<xav:MaximumCandidateListSize>10</xav:MaximumCandidateListSize>"));
    }

    #[test]
    fn envelope_maps_query_fields_onto_address_key_format() {
        let xml = build_xav_request(&sample_config(), &sample_query()).expect("envelope builds");

        assert!(xml.contains("<xav:AddressLine>Mark</xav:AddressLine>"));
        assert!(xml.contains("<xav:PoliticalDivision2>Baltimore</xav:PoliticalDivision2>"));
        assert!(xml.contains("<xav:PoliticalDivision1>MD</xav:PoliticalDivision1>"));
        assert!(xml.contains("<xav:PostcodePrimaryLow>21236</xav:PostcodePrimaryLow>"));
        assert!(xml.contains("<xav:CountryCode>US</xav:CountryCode>"));
    }

    #[test]
    fn envelope_escapes_reserved_characters_in_free_text() {
        let mut query = sample_query();
        query.address_line = "5 Oak & Elm <Rear>".to_string();

        let xml = build_xav_request(&sample_config(), &query).expect("envelope builds");

        assert!(xml.contains("5 Oak &amp; Elm &lt;Rear&gt;"));
    }
}
