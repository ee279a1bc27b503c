//! Challenge parser integration tests against real-world header shapes.

use authnet::parse_challenges;

#[test]
fn test_apache_digest_header() {
    let entries = parse_challenges(
        "Digest realm=\"http-auth@example.org\", qop=\"auth, auth-int\", algorithm=MD5, \
         nonce=\"7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v\", \
         opaque=\"FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS\"",
    );

    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.scheme, "Digest");
    assert_eq!(entry.values.get("realm"), Some("http-auth@example.org"));
    assert_eq!(entry.values.get("qop"), Some("auth, auth-int"));
    assert_eq!(entry.values.get("algorithm"), Some("MD5"));
    assert_eq!(
        entry.values.get("opaque"),
        Some("FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS")
    );
}

#[test]
fn test_raw_value_round_trips_single_challenge() {
    let header = "Basic realm=\"WallyWorld\", charset=\"UTF-8\"";
    let entries = parse_challenges(header);

    assert_eq!(entries.len(), 1);
    // The raw value is the exact substring after the scheme token.
    assert_eq!(entries[0].raw_value, &header["Basic ".len()..]);
}

#[test]
fn test_multi_line_equivalent_header() {
    // A server folding several schemes into one header line.
    let entries =
        parse_challenges("Newauth realm=\"apps\", type=1, title=\"Login to \\\"apps\\\"\", Basic realm=\"simple\"");

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].scheme, "Newauth");
    assert_eq!(entries[0].values.get("realm"), Some("apps"));
    assert_eq!(entries[0].values.get("type"), Some("1"));
    assert_eq!(entries[0].values.get("title"), Some("Login to \"apps\""));
    assert_eq!(entries[1].scheme, "Basic");
    assert_eq!(entries[1].values.get("realm"), Some("simple"));
}

#[test]
fn test_raw_values_keep_escapes_and_quotes() {
    let entries = parse_challenges("Newauth title=\"Login to \\\"apps\\\"\"");
    let entry = &entries[0];

    assert_eq!(entry.values.get("title"), Some("Login to \"apps\""));
    assert_eq!(
        entry.raw_values.get("title"),
        Some("\"Login to \\\"apps\\\"\"")
    );
}

#[test]
fn test_duplicate_parameters_survive() {
    let entries = parse_challenges("Basic realm=\"foo\", realm=\"bar\"");
    let realms: Vec<_> = entries[0].values.get_all("realm").collect();
    assert_eq!(realms, vec!["foo", "bar"]);

    let raw_realms: Vec<_> = entries[0].raw_values.get_all("realm").collect();
    assert_eq!(raw_realms, vec!["\"foo\"", "\"bar\""]);
}

#[test]
fn test_garbage_inputs_never_panic() {
    for input in [
        "",
        ",",
        ",,,",
        "   ",
        "=",
        "=value",
        "\\",
        "\"",
        "\"unclosed",
        "Basic realm=\"unclosed",
        "Basic realm=",
        "Basic =x",
        "Basic realm = ",
        "Digest a=b, c",
        "a=\"\\\"",
        "scheme key=\"v\\\\\"",
    ] {
        // Best effort, never a crash.
        let _ = parse_challenges(input);
    }
}

#[test]
fn test_scheme_only_challenges() {
    let entries = parse_challenges("Negotiate, NTLM, Basic realm=\"x\"");
    let schemes: Vec<_> = entries.iter().map(|e| e.scheme.as_str()).collect();
    assert_eq!(schemes, vec!["Negotiate", "NTLM", "Basic"]);
}
