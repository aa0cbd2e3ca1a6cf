// Unit tests for the error taxonomy

use super::*;

#[test]
fn test_page_error_messages() {
    assert_eq!(
        PageError::Detached.to_string(),
        "element is no longer attached to the document"
    );
    assert_eq!(
        PageError::Unavailable("query failed".to_string()).to_string(),
        "page operation failed: query failed"
    );
}

#[test]
fn test_engine_error_messages() {
    assert_eq!(
        EngineError::BodyUnavailable.to_string(),
        "document body not available"
    );
    assert_eq!(
        EngineError::ContainerCreation("no body".to_string()).to_string(),
        "failed to create overlay container: no body"
    );
}

#[test]
fn test_page_error_converts_transparently() {
    let err: EngineError = PageError::Detached.into();
    // Transparent wrapping keeps the page error's message.
    assert_eq!(
        err.to_string(),
        "element is no longer attached to the document"
    );
    assert!(matches!(err, EngineError::Page(PageError::Detached)));
}
