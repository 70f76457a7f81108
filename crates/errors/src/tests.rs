use crate::*;

#[test]
fn test_not_found_messages() {
    assert_eq!(MarketplaceError::UserNotFound.to_string(), "User not found");
    assert_eq!(MarketplaceError::ServiceNotFound.to_string(), "Service not found");
    assert_eq!(MarketplaceError::TaskNotFound.to_string(), "Task not found");
    assert_eq!(
        MarketplaceError::SubmitTaskNotFound.to_string(),
        "Submit Task not found"
    );
    assert_eq!(MarketplaceError::PaymentNotFound.to_string(), "Payment not found");
}

#[test]
fn test_http_status_codes() {
    assert_eq!(MarketplaceError::TaskNotFound.http_status_code(), 404);
    assert_eq!(MarketplaceError::PaymentNotFound.http_status_code(), 404);
    assert_eq!(
        MarketplaceError::bad_request("Already submitted").http_status_code(),
        400
    );
    assert_eq!(MarketplaceError::validation_error("name").http_status_code(), 400);
    assert_eq!(MarketplaceError::internal("boom").http_status_code(), 500);
    assert_eq!(MarketplaceError::database_error("down").http_status_code(), 500);
}

#[test]
fn test_bad_request_displays_message_verbatim() {
    let err = MarketplaceError::bad_request("Already submitted");
    assert_eq!(err.to_string(), "Already submitted");
    assert_eq!(err.user_message(), "Already submitted");
    assert_eq!(err.error_type(), "BAD_REQUEST");
}

#[test]
fn test_internal_errors_are_masked() {
    let err = MarketplaceError::database_error("connection refused on 10.0.0.3");
    assert_eq!(err.user_message(), "Internal server error");
    assert!(!err.is_not_found());
}

#[test]
fn test_from_serde_json_error() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: MarketplaceError = json_err.into();
    assert!(matches!(err, MarketplaceError::Serialization(_)));
}

#[test]
fn test_from_validation_errors() {
    let mut errors = validator::ValidationErrors::new();
    errors.add("name", validator::ValidationError::new("length"));
    let err: MarketplaceError = errors.into();
    match err {
        MarketplaceError::Validation(msg) => assert!(msg.contains("name: length")),
        other => panic!("Expected Validation error, got {other:?}"),
    }
}
