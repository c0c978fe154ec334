use super::domain::{AddressQuery, Outcome};
use super::envelope::build_xav_request;
use super::response::parse_xav_response;
use super::ValidationError;
use crate::config::UpsConfig;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

const PRODUCTION_ENDPOINT: &str = "https://onlinetools.ups.com/webservices/XAV";
const TEST_ENDPOINT: &str = "https://wwwcie.ups.com/webservices/XAV";
const SOAP_ACTION: &str = "ProcessXAV";
const VENDOR_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the UPS ProcessXAV operation.
///
/// Holds only configuration. Each [`validate`](Self::validate) call builds a
/// fresh transport handle and a fresh security header, so endpoint and
/// credential changes between calls always take effect.
#[derive(Debug)]
pub struct AddressValidationClient {
    config: UpsConfig,
}

impl AddressValidationClient {
    /// Fails with [`ValidationError::WsdlMissing`] when the vendor interface
    /// definition is not at the configured path. Without it no valid request
    /// can be constructed, so callers must treat this as fatal rather than
    /// attempt a degraded call.
    pub fn new(config: UpsConfig) -> Result<Self, ValidationError> {
        if !config.wsdl_path.is_file() {
            return Err(ValidationError::WsdlMissing {
                path: config.wsdl_path.clone(),
            });
        }
        Ok(Self { config })
    }

    /// Target URL for the next call, derived from `test_mode` at call time.
    pub fn endpoint_url(&self) -> String {
        if let Some(endpoint) = &self.config.endpoint_override {
            return endpoint.clone();
        }
        if self.config.test_mode {
            TEST_ENDPOINT.to_string()
        } else {
            PRODUCTION_ENDPOINT.to_string()
        }
    }

    /// Submits the query to the vendor and classifies the reply.
    ///
    /// Returns [`Outcome::NoCandidates`] when the vendor explicitly declines
    /// to suggest completions; that case is a valid result, not an error.
    pub async fn validate(&self, query: &AddressQuery) -> Result<Outcome, ValidationError> {
        let endpoint = self.endpoint_url();
        let envelope = build_xav_request(&self.config, query)?;

        let transport = reqwest::Client::builder()
            .timeout(VENDOR_TIMEOUT)
            .build()
            .map_err(generic_transport)?;

        debug!(%endpoint, "submitting ProcessXAV request");

        let reply = transport
            .post(&endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", SOAP_ACTION)
            .body(envelope)
            .send()
            .await
            .map_err(generic_transport)?;

        let status = reply.status();
        let body = reply.text().await.map_err(generic_transport)?;

        classify_reply(status.as_u16(), &body)
    }
}

fn classify_reply(status: u16, body: &str) -> Result<Outcome, ValidationError> {
    let parsed = parse_xav_response(body)?;

    if let Some(fault) = parsed.fault {
        return Err(ValidationError::Transport {
            code: fault.code,
            message: fault
                .description
                .unwrap_or_else(|| "vendor returned an unspecified fault".to_string()),
        });
    }

    if parsed.no_candidates {
        return Ok(Outcome::NoCandidates);
    }

    if !parsed.candidates.is_empty() {
        return Ok(Outcome::Candidates(parsed.candidates));
    }

    Err(ValidationError::Transport {
        code: None,
        message: format!(
            "vendor reply (HTTP {status}) contained neither candidates nor a no-candidates indicator"
        ),
    })
}

fn generic_transport(err: reqwest::Error) -> ValidationError {
    ValidationError::Transport {
        code: None,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn stub_wsdl(tag: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("xav-client-{tag}-{}.wsdl", std::process::id()));
        std::fs::write(&path, "<definitions/>").expect("wsdl stub written");
        path
    }

    fn config(test_mode: bool, wsdl_path: PathBuf) -> UpsConfig {
        UpsConfig {
            test_mode,
            username: "shipper".to_string(),
            password: "hunter2".to_string(),
            license_number: "ABC123".to_string(),
            wsdl_path,
            endpoint_override: None,
        }
    }

    #[test]
    fn test_mode_selects_the_test_endpoint() {
        let client =
            AddressValidationClient::new(config(true, stub_wsdl("test-mode"))).expect("client builds");
        assert_eq!(client.endpoint_url(), TEST_ENDPOINT);
    }

    #[test]
    fn production_mode_selects_the_production_endpoint() {
        let client =
            AddressValidationClient::new(config(false, stub_wsdl("prod-mode"))).expect("client builds");
        assert_eq!(client.endpoint_url(), PRODUCTION_ENDPOINT);
    }

    #[test]
    fn endpoint_override_wins_over_mode_selection() {
        let mut config = config(true, stub_wsdl("override"));
        config.endpoint_override = Some("http://127.0.0.1:9/xav".to_string());

        let client = AddressValidationClient::new(config).expect("client builds");
        assert_eq!(client.endpoint_url(), "http://127.0.0.1:9/xav");
    }

    #[test]
    fn missing_wsdl_is_a_fatal_configuration_error() {
        let mut config = config(true, stub_wsdl("missing"));
        config.wsdl_path = std::env::temp_dir().join("definitely-not-there.wsdl");

        let err = AddressValidationClient::new(config).expect_err("construction fails");
        assert!(matches!(err, ValidationError::WsdlMissing { .. }));
    }

    #[test]
    fn reply_without_candidates_or_indicator_is_a_transport_error() {
        let body = "<Envelope><Body><XAVResponse/></Body></Envelope>";
        let err = classify_reply(200, body).expect_err("malformed reply rejected");
        assert!(matches!(err, ValidationError::Transport { code: None, .. }));
    }

    #[test]
    fn fault_reply_surfaces_the_vendor_error_code() {
        let body = r#"<Envelope><Body><Fault>
            <faultstring>rejected</faultstring>
            <detail><Errors><ErrorDetail><PrimaryErrorCode>
                <Code>20002</Code>
                <Description>Invalid security token</Description>
            </PrimaryErrorCode></ErrorDetail></Errors></detail>
        </Fault></Body></Envelope>"#;

        let err = classify_reply(500, body).expect_err("fault surfaces as error");
        match err {
            ValidationError::Transport { code, message } => {
                assert_eq!(code.as_deref(), Some("20002"));
                assert_eq!(message, "Invalid security token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
