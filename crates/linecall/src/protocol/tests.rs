//! Unit tests for envelope parsing and serialization.

use rstest::rstest;
use serde_json::json;

use super::*;

// ---------------------------------------------------------------------------
// Inbound calls
// ---------------------------------------------------------------------------

#[test]
fn parses_full_call() {
    let request = parse_call(
        r#"{"rpc":{"op":"call"},"procedure":"query","args":["select 1"],"kwargs":{"values":[1]}}"#,
    )
    .expect("parse call");
    assert_eq!(request.procedure(), "query");
    assert_eq!(request.args(), &[json!("select 1")]);
    assert_eq!(request.kwargs().get("values"), Some(&json!([1])));
}

#[test]
fn missing_args_and_kwargs_default_to_empty() {
    let request =
        parse_call(r#"{"rpc":{"op":"call"},"procedure":"ping"}"#).expect("parse bare call");
    assert!(request.args().is_empty());
    assert!(request.kwargs().is_empty());
}

#[test]
fn trims_trailing_newline() {
    let request = parse_call("{\"rpc\":{\"op\":\"call\"},\"procedure\":\"ping\"}\r\n")
        .expect("parse with newline");
    assert_eq!(request.procedure(), "ping");
}

#[test]
fn ignores_unknown_top_level_keys() {
    let request = parse_call(r#"{"rpc":{"op":"call","id":7},"procedure":"ping","trace":true}"#)
        .expect("parse with extras");
    assert_eq!(request.procedure(), "ping");
}

#[test]
fn rejects_invalid_json() {
    let error = parse_call("not json").expect_err("not json");
    assert!(matches!(error, ProtocolError::MalformedRequest { .. }));
    assert_eq!(error.classe(), MALFORMED_REQUEST);
}

#[rstest]
#[case::ping("ping")]
#[case::return_op("return")]
#[case::upper_call("CALL")]
fn rejects_operations_other_than_call(#[case] op: &str) {
    let line = json!({"rpc": {"op": op}}).to_string();
    let error = parse_call(&line).expect_err("operation should be rejected");
    assert_eq!(error, ProtocolError::invalid_operation(op));
    assert_eq!(
        error.message(),
        format!("Can't handle the RPC operation: {op}")
    );
}

#[rstest]
#[case::array(r#"[1,2,3]"#)]
#[case::no_rpc(r#"{"procedure":"ping"}"#)]
#[case::rpc_not_object(r#"{"rpc":"call","procedure":"ping"}"#)]
#[case::missing_op(r#"{"rpc":{},"procedure":"ping"}"#)]
#[case::op_not_string(r#"{"rpc":{"op":1},"procedure":"ping"}"#)]
#[case::missing_procedure(r#"{"rpc":{"op":"call"}}"#)]
#[case::procedure_not_string(r#"{"rpc":{"op":"call"},"procedure":3}"#)]
#[case::args_not_array(r#"{"rpc":{"op":"call"},"procedure":"ping","args":{}}"#)]
#[case::kwargs_not_object(r#"{"rpc":{"op":"call"},"procedure":"ping","kwargs":[]}"#)]
fn rejects_invalid_envelopes(#[case] line: &str) {
    let error = parse_call(line).expect_err("envelope should be rejected");
    assert!(
        matches!(error, ProtocolError::InvalidEnvelope { .. }),
        "unexpected error for {line}: {error:?}"
    );
    assert_eq!(error.classe(), INVALID_ENVELOPE);
}

#[test]
fn serializes_call_with_header_first() {
    let request = CallRequest::new("add", vec![json!(2), json!(3)], Map::new());
    let line = serde_json::to_string(&request).expect("serialize call");
    assert_eq!(
        line,
        r#"{"rpc":{"op":"call"},"procedure":"add","args":[2,3],"kwargs":{}}"#
    );
}

// ---------------------------------------------------------------------------
// Outbound responses
// ---------------------------------------------------------------------------

#[test]
fn serializes_return_envelope() {
    let line = serde_json::to_string(&Response::success(json!(5))).expect("serialize return");
    assert_eq!(line, r#"{"rpc":{"op":"return"},"result":5}"#);
}

#[test]
fn serializes_null_result() {
    let line = serde_json::to_string(&Response::success(Value::Null)).expect("serialize null");
    assert_eq!(line, r#"{"rpc":{"op":"return"},"result":null}"#);
}

#[test]
fn serializes_error_envelope() {
    let line = serde_json::to_string(&Response::error(INVALID_PROCEDURE, "missing"))
        .expect("serialize error");
    assert_eq!(
        line,
        r#"{"rpc":{"op":"error"},"classe":"invalid_procedure","message":"missing"}"#
    );
}

#[test]
fn reads_response_lines() {
    let response = Response::from_line("{\"rpc\":{\"op\":\"return\"},\"result\":[1,2]}\n")
        .expect("parse return line");
    assert_eq!(response, Response::success(json!([1, 2])));
    assert!(response.is_return());

    let failure = Response::from_line(
        r#"{"rpc":{"op":"error"},"classe":"KeyError","message":"'x'"}"#,
    )
    .expect("parse error line");
    assert_eq!(failure.classe(), Some("KeyError"));
}

#[test]
fn rejects_incomplete_error_line() {
    assert!(Response::from_line(r#"{"rpc":{"op":"error"},"classe":"KeyError"}"#).is_err());
    assert!(Response::from_line(r#"{"rpc":{"op":"call"},"procedure":"x"}"#).is_err());
}

#[test]
fn unknown_procedure_reports_bare_name() {
    let error = ProtocolError::unknown_procedure("missing");
    assert_eq!(
        error.to_response(),
        Response::error("invalid_procedure", "missing")
    );
}
