//! Integration tests for request failure classification.

use aviator_core::{ApiError, FailureClass, RequestContext, classify_api_error};

#[test]
fn error_classification_tests_polling_failures_are_absorbed() {
    let network = ApiError::Network("connection refused".to_string());
    let server = ApiError::Server {
        status: 503,
        detail: None,
    };

    assert_eq!(
        classify_api_error(RequestContext::Polling, &network),
        FailureClass::Offline
    );
    assert_eq!(
        classify_api_error(RequestContext::Polling, &server),
        FailureClass::Offline
    );
    assert_eq!(
        classify_api_error(RequestContext::Polling, &ApiError::Unauthorized),
        FailureClass::Reauthorize
    );
}

#[test]
fn error_classification_tests_launch_surfaces_structured_detail() {
    let error = ApiError::from_status(404, br#"{"detail":"Executable file not found on disk"}"#);
    assert_eq!(
        classify_api_error(RequestContext::Launch, &error),
        FailureClass::Surface("Executable file not found on disk".to_string())
    );

    let legacy = ApiError::from_status(500, br#"{"error":"access denied"}"#);
    assert_eq!(
        classify_api_error(RequestContext::Launch, &legacy),
        FailureClass::Surface("access denied".to_string())
    );

    let bare = ApiError::from_status(500, b"Not Found");
    assert_eq!(
        classify_api_error(RequestContext::Launch, &bare),
        FailureClass::Surface("Internal error".to_string())
    );
}

#[test]
fn error_classification_tests_launch_unauthorized_is_not_surfaced() {
    let error = ApiError::from_status(401, b"");
    assert!(error.is_unauthorized());
    assert_eq!(
        classify_api_error(RequestContext::Launch, &error),
        FailureClass::Reauthorize
    );
    assert_eq!(
        classify_api_error(RequestContext::Launch, &ApiError::Network("reset".to_string())),
        FailureClass::SurfaceGeneric
    );
}
