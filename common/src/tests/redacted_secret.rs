use crate::RedactedSecret;

/// **VALUE**: Verifies a provider secret never leaks through Debug or Display.
///
/// **WHY THIS MATTERS**: `SyncContext` is logged with `{:?}` when a pull or
/// push starts. A leaked GitHub PAT in a log file is a real incident.
///
/// **BUG THIS CATCHES**: Would catch a derived `Debug` sneaking back in.
#[test]
fn given_secret_when_formatted_then_value_is_redacted() {
    // GIVEN: A secret
    let secret = RedactedSecret::new("ghp_supersecretvalue");

    // WHEN: Formatting both ways
    let debug = format!("{:?}", secret);
    let display = format!("{}", secret);

    // THEN: Neither contains the value
    assert!(!debug.contains("supersecret"));
    assert!(!display.contains("supersecret"));
    assert!(debug.contains("REDACTED"));
}

#[test]
fn given_secret_when_exposed_then_returns_original_value() {
    // GIVEN
    let secret = RedactedSecret::from("abc123");

    // WHEN / THEN
    assert_eq!(secret.expose(), "abc123");
    assert_eq!(secret.len(), 6);
    assert!(!secret.is_empty());
}

#[test]
fn given_whitespace_secret_when_checking_empty_then_treated_as_missing() {
    // GIVEN: A secret that only contains whitespace (pasted by accident)
    let secret = RedactedSecret::new("   ");

    // WHEN / THEN: Counts as not provided
    assert!(secret.is_empty());
    assert!(RedactedSecret::default().is_empty());
}

/// **VALUE**: Verifies serialising a secret fails instead of writing it out.
///
/// **BUG THIS CATCHES**: Would catch someone adding `#[derive(Serialize)]` to
/// a struct holding a secret and persisting it into `providers.toml` or a
/// token document.
#[test]
fn given_secret_when_serialized_then_returns_error() {
    // GIVEN
    let secret = RedactedSecret::new("jsonbin-master-key");

    // WHEN
    let result = serde_json::to_string(&secret);

    // THEN
    let error = result.expect_err("serialisation must fail");
    assert!(!error.to_string().contains("jsonbin-master-key"));
}
