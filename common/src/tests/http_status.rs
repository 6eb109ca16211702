use crate::HttpStatusCode;

/// **VALUE**: Verifies credential failures are distinguished from other 4xx codes.
///
/// **WHY THIS MATTERS**: A 401/403 from a provider maps to the provider's
/// credential error code (e.g. `GITHUB_CREDENTIAL_ERROR`), while other client
/// errors map to the general connection error.
///
/// **BUG THIS CATCHES**: Would catch if 404 were treated as a bad token,
/// which would tell users to rotate a perfectly valid secret.
#[test]
fn given_status_codes_when_checking_credential_failure_then_only_401_and_403_match() {
    // GIVEN/WHEN/THEN
    assert!(HttpStatusCode(401).is_credential_failure());
    assert!(HttpStatusCode(403).is_credential_failure());
    assert!(!HttpStatusCode(404).is_credential_failure());
    assert!(!HttpStatusCode(500).is_credential_failure());
}

#[test]
fn given_status_codes_when_categorising_then_client_and_server_ranges_are_disjoint() {
    // GIVEN: Boundary codes
    let cases = [
        (399, false, false),
        (400, true, false),
        (404, true, false),
        (499, true, false),
        (500, false, true),
        (599, false, true),
        (600, false, false),
    ];

    for (code, client, server) in cases {
        // WHEN: Categorising
        let status = HttpStatusCode::from(code);

        // THEN: Matches the expected range
        assert_eq!(status.is_client_error(), client, "client check for {code}");
        assert_eq!(status.is_server_error(), server, "server check for {code}");
    }
}

#[test]
fn given_404_when_checking_not_found_then_true() {
    assert!(HttpStatusCode(404).is_not_found());
    assert!(!HttpStatusCode(410).is_not_found());
    assert_eq!(HttpStatusCode(404).to_string(), "404");
}
