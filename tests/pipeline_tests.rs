/// Integration tests with a mocked HubSpot API
/// Tests the complete lead pipeline without hitting real external services
use lead_signup_api::config::Config;
use lead_signup_api::errors::AppError;
use lead_signup_api::hubspot_client::HubspotClient;
use lead_signup_api::mailer::Mailer;
use lead_signup_api::models::{SaveSpecsRequest, SignupRequest};
use lead_signup_api::otp_store::OtpStore;
use lead_signup_api::services::LeadService;
use lead_signup_api::validation::Validator;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Helper function to create test config
fn create_test_config(hubspot_base_url: String) -> Config {
    Config {
        port: 8080,
        smtp_host: "127.0.0.1".to_string(),
        smtp_port: 2525,
        smtp_user: "test_user".to_string(),
        smtp_pass: "test_pass".to_string(),
        from_email: "noreply@example.com".to_string(),
        hubspot_token: "test_token".to_string(),
        hubspot_base_url,
        allowed_email_domains: None,
        allowed_vendors: None,
    }
}

/// Builds a pipeline wired to the mock CRM; returns the OTP store handle so
/// tests can issue codes without going through SMTP.
fn create_service(config: &Config) -> (LeadService, OtpStore) {
    let otp_store = OtpStore::new();
    let service = LeadService::new(
        Validator::from_config(config),
        otp_store.clone(),
        Mailer::new(config).expect("mailer should build from test config"),
        HubspotClient::new(
            config.hubspot_base_url.clone(),
            config.hubspot_token.clone(),
        )
        .expect("client should build from test config"),
    );
    (service, otp_store)
}

fn signup_request(email: &str) -> SignupRequest {
    SignupRequest {
        email: Some(email.to_string()),
        first_name: Some("Jo".to_string()),
        last_name: Some("Doe".to_string()),
        business_name: Some("Acme".to_string()),
        vat_number: None,
        country_: Some("US".to_string()),
    }
}

/// Matcher asserting that a named property is absent from the outbound
/// property map (sanitization and status-regress guarantees).
struct PropertyAbsent(&'static str);

impl Match for PropertyAbsent {
    fn matches(&self, request: &Request) -> bool {
        let body: serde_json::Value = match serde_json::from_slice(&request.body) {
            Ok(v) => v,
            Err(_) => return false,
        };
        body.get("properties")
            .map_or(true, |p| p.get(self.0).is_none())
    }
}

#[tokio::test]
async fn test_signup_creates_contact_when_absent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/contacts/search"))
        .and(header("Authorization", "Bearer test_token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"total": 0, "results": []})),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/contacts"))
        .and(body_partial_json(json!({
            "properties": {
                "email": "a@yahoo.com",
                "firstname": "Jo",
                "lastname": "Doe",
                "business_name": "Acme",
                "country_": "US",
                "lifecyclestage": "lead",
                "user_status": "signup"
            }
        })))
        // vat_number was not provided, so sanitization must strip it
        .and(PropertyAbsent("vat_number"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "101",
            "properties": {"email": "a@yahoo.com", "user_status": "signup"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let (service, _) = create_service(&config);

    let outcome = service.signup(signup_request("a@yahoo.com")).await.unwrap();
    assert!(outcome.created);
    assert_eq!(outcome.contact.id, "101");
}

#[tokio::test]
async fn test_signup_updates_existing_contact() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/contacts/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "results": [{"id": "42", "properties": {"email": "a@gmail.com"}}]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/crm/v3/objects/contacts/42"))
        .and(body_partial_json(json!({
            "properties": {"firstname": "Jo", "lastname": "Doe"}
        })))
        // A re-submitted step 1 must not regress user_status
        .and(PropertyAbsent("user_status"))
        .and(PropertyAbsent("lifecyclestage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42",
            "properties": {"email": "a@gmail.com"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let (service, _) = create_service(&config);

    let outcome = service.signup(signup_request("a@gmail.com")).await.unwrap();
    assert!(!outcome.created);
    assert_eq!(outcome.contact.id, "42");
}

#[tokio::test]
async fn test_signup_rejects_unsupported_domain_before_any_crm_call() {
    // No mocks mounted: a CRM call would surface as an external API error,
    // so getting BadRequest proves validation failed fast.
    let mock_server = MockServer::start().await;
    let config = create_test_config(mock_server.uri());
    let (service, _) = create_service(&config);

    let err = service
        .signup(signup_request("user@example.com"))
        .await
        .unwrap_err();
    match err {
        AppError::BadRequest(msg) => {
            assert_eq!(msg, "Email must be from a supported provider")
        }
        other => panic!("expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn test_signup_fails_on_first_broken_rule() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(mock_server.uri());
    let (service, _) = create_service(&config);

    // Both firstName and VAT are broken; the earlier rule wins
    let mut req = signup_request("a@gmail.com");
    req.first_name = None;
    req.vat_number = Some("GB 123".to_string());

    let err = service.signup(req).await.unwrap_err();
    match err {
        AppError::BadRequest(msg) => assert_eq!(msg, "First name is required"),
        other => panic!("expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn test_signup_rejects_malformed_vat() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(mock_server.uri());
    let (service, _) = create_service(&config);

    let mut req = signup_request("a@gmail.com");
    req.vat_number = Some("GB-123".to_string());

    let err = service.signup(req).await.unwrap_err();
    match err {
        AppError::BadRequest(msg) => {
            assert_eq!(msg, "VAT number can contain only letters and numbers")
        }
        other => panic!("expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn test_check_email_reports_existence() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/contacts/search"))
        .and(body_partial_json(json!({
            "filterGroups": [{"filters": [{
                "propertyName": "email",
                "operator": "EQ",
                "value": "a@gmail.com"
            }]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "results": [{"id": "7", "properties": {"email": "a@gmail.com"}}]
        })))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let (service, _) = create_service(&config);

    // Lookup key is the normalized email
    let exists = service
        .check_email_exists(Some("  A@Gmail.com ".to_string()))
        .await
        .unwrap();
    assert!(exists);
}

#[tokio::test]
async fn test_check_email_missing_contact() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/contacts/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"total": 0, "results": []})),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let (service, _) = create_service(&config);

    let exists = service
        .check_email_exists(Some("b@gmail.com".to_string()))
        .await
        .unwrap();
    assert!(!exists);
}

#[tokio::test]
async fn test_save_specs_contact_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/contacts/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"total": 0, "results": []})),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let (service, _) = create_service(&config);

    let err = service
        .save_specs(SaveSpecsRequest {
            email: Some("a@gmail.com".to_string()),
            vendor: Some(vec!["E-Soft".to_string()]),
            number_of_users: Some(10),
            recommended_cpu: None,
            recommended_ram: None,
            recommended_storage: None,
            final_ram: None,
            final_storage: None,
        })
        .await
        .unwrap_err();
    match err {
        AppError::NotFound(msg) => assert_eq!(msg, "Contact not found"),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_save_specs_updates_vendor_and_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/contacts/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "results": [{"id": "7", "properties": {"email": "a@gmail.com"}}]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/crm/v3/objects/contacts/7"))
        .and(body_partial_json(json!({
            "properties": {
                "vendor": "E-Soft, BTMS",
                "number_of_users": 25,
                "recommended_cpu": 8,
                "user_status": "submitted"
            }
        })))
        // Sizing fields that were not supplied must be stripped, not nulled
        .and(PropertyAbsent("final_ram"))
        .and(PropertyAbsent("final_storage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "7",
            "properties": {"vendor": "E-Soft, BTMS", "user_status": "submitted"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let (service, _) = create_service(&config);

    let contact = service
        .save_specs(SaveSpecsRequest {
            email: Some("a@gmail.com".to_string()),
            vendor: Some(vec!["E-Soft".to_string(), "BTMS".to_string()]),
            number_of_users: Some(25),
            recommended_cpu: Some(json!(8)),
            recommended_ram: None,
            recommended_storage: None,
            final_ram: None,
            final_storage: None,
        })
        .await
        .unwrap();
    assert_eq!(contact.id, "7");
}

#[tokio::test]
async fn test_save_specs_rejects_unknown_vendor() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(mock_server.uri());
    let (service, _) = create_service(&config);

    let err = service
        .save_specs(SaveSpecsRequest {
            email: Some("a@gmail.com".to_string()),
            vendor: Some(vec!["Acme".to_string()]),
            number_of_users: Some(10),
            recommended_cpu: None,
            recommended_ram: None,
            recommended_storage: None,
            final_ram: None,
            final_storage: None,
        })
        .await
        .unwrap_err();
    match err {
        AppError::BadRequest(msg) => assert_eq!(msg, "Invalid software selected: Acme"),
        other => panic!("expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn test_save_specs_rejects_non_positive_user_count() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(mock_server.uri());
    let (service, _) = create_service(&config);

    let err = service
        .save_specs(SaveSpecsRequest {
            email: Some("a@gmail.com".to_string()),
            vendor: Some(vec!["Pastel".to_string()]),
            number_of_users: Some(0),
            recommended_cpu: None,
            recommended_ram: None,
            recommended_storage: None,
            final_ram: None,
            final_storage: None,
        })
        .await
        .unwrap_err();
    match err {
        AppError::BadRequest(msg) => {
            assert_eq!(msg, "Number of users must be a valid positive number")
        }
        other => panic!("expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn test_crm_error_propagates_as_external_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crm/v3/objects/contacts/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let (service, _) = create_service(&config);

    let err = service
        .check_email_exists(Some("a@gmail.com".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ExternalApiError(_)));
}

#[tokio::test]
async fn test_otp_round_trip_through_pipeline() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(mock_server.uri());
    let (service, otp_store) = create_service(&config);

    // Issue directly on the shared store (skipping SMTP delivery)
    let code = otp_store.issue("a@gmail.com").await;

    // Verification normalizes the submitted email to the same key
    service
        .confirm_verification(Some(" A@Gmail.com ".to_string()), Some(code.clone()))
        .await
        .unwrap();

    // Consumed: the same code cannot be redeemed twice
    let err = service
        .confirm_verification(Some("a@gmail.com".to_string()), Some(code))
        .await
        .unwrap_err();
    match err {
        AppError::BadRequest(msg) => assert_eq!(msg, "Invalid OTP"),
        other => panic!("expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn test_confirm_verification_requires_both_fields() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(mock_server.uri());
    let (service, _) = create_service(&config);

    let err = service
        .confirm_verification(Some("a@gmail.com".to_string()), None)
        .await
        .unwrap_err();
    match err {
        AppError::BadRequest(msg) => assert_eq!(msg, "Email and OTP are required"),
        other => panic!("expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn test_request_verification_rejects_invalid_email_without_sending() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(mock_server.uri());
    let (service, _) = create_service(&config);

    let err = service
        .request_verification(Some("user@example.com".to_string()))
        .await
        .unwrap_err();
    match err {
        AppError::BadRequest(msg) => assert_eq!(msg, "Invalid or unsupported email domain"),
        other => panic!("expected BadRequest, got {:?}", other),
    }

    let err = service.request_verification(None).await.unwrap_err();
    match err {
        AppError::BadRequest(msg) => assert_eq!(msg, "Email is required"),
        other => panic!("expected BadRequest, got {:?}", other),
    }
}
