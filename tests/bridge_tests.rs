use std::thread;
use std::time::Duration;

use form_pilot::bridge::channel::{BridgeHost, ToolRequest, ToolResponse, connect};
use form_pilot::bridge::tools::{DETECT_FIELDS, FILL_FIELDS, VALIDATE_FILL, tool_specs};
use form_pilot::error::FormPilotError;
use serde_json::{Value, json};
use uuid::Uuid;

mod common;
use crate::common::utils::application_page;

// =========================================================================
// Declarations
// =========================================================================

#[test]
fn declares_three_tools_with_schemas() {
    let specs = tool_specs();
    let names: Vec<_> = specs.iter().map(|s| s.name).collect();
    assert_eq!(names, vec![DETECT_FIELDS, FILL_FIELDS, VALIDATE_FILL]);

    for spec in &specs {
        assert_eq!(spec.input_schema["type"], "object", "{} schema", spec.name);
        assert!(!spec.description.is_empty());
    }
    assert_eq!(specs[1].input_schema["required"], json!(["mappings"]));
    assert_eq!(
        specs[2].input_schema["properties"]["clearWrong"]["type"],
        "boolean"
    );

    let json = serde_json::to_value(&specs[0]).unwrap();
    assert!(json.get("inputSchema").is_some(), "camelCase on the wire");
}

// =========================================================================
// Page side
// =========================================================================

fn request(tool: &str, input: Value) -> (Uuid, String) {
    let req = ToolRequest {
        request_id: Uuid::new_v4(),
        tool: tool.into(),
        input,
    };
    (req.request_id, serde_json::to_string(&req).unwrap())
}

#[test]
fn host_answers_with_matching_id() {
    let mut host = BridgeHost::new(application_page());
    let (id, raw) = request(DETECT_FIELDS, json!({}));

    let reply: ToolResponse = serde_json::from_str(&host.handle(&raw).unwrap()).unwrap();
    assert_eq!(reply.request_id, id);
    assert!(reply.ok);
    let fields = reply.result.unwrap();
    assert_eq!(fields["fields"].as_array().map(Vec::len), Some(3));
    assert_eq!(fields["fields"][0]["semanticType"], "email");
}

#[test]
fn host_reports_errors_in_band() {
    let mut host = BridgeHost::new(application_page());

    let (_, raw) = request("drop_tables", json!({}));
    let reply: ToolResponse = serde_json::from_str(&host.handle(&raw).unwrap()).unwrap();
    assert!(!reply.ok);
    assert!(reply.error.unwrap().contains("unknown tool"));

    let (_, raw) = request(FILL_FIELDS, json!({"mappings": "nope"}));
    let reply: ToolResponse = serde_json::from_str(&host.handle(&raw).unwrap()).unwrap();
    assert!(!reply.ok);
    assert!(reply.error.unwrap().contains("invalid input"));

    assert_eq!(host.handle("{not json"), None, "No id to answer");
}

// =========================================================================
// Round trips
// =========================================================================

#[test]
fn detect_fill_validate_over_the_bridge() {
    let (client, endpoint) = connect(Duration::from_secs(5));
    let page = BridgeHost::new(application_page()).serve(endpoint);

    let detected = client.call(DETECT_FIELDS, json!({})).unwrap();
    let fields = detected["fields"].as_array().cloned().unwrap_or_default();
    assert_eq!(fields.len(), 3);

    let mappings = json!([
        {"selector": fields[0]["selector"], "value": "a@b.com"},
        {"index": 1, "value": "Acme"},
        {"selector": fields[2]["selector"], "value": "We do X"}
    ]);
    let filled = client
        .call(FILL_FIELDS, json!({"mappings": mappings}))
        .unwrap();
    assert_eq!(filled["filled"], 3);
    assert_eq!(filled["skipped"], 0);

    let report = client
        .call(VALIDATE_FILL, json!({"mappings": mappings, "clearWrong": true}))
        .unwrap();
    assert_eq!(report["ok"], true);
    assert_eq!(report["fixedCount"], 0);
    assert_eq!(client.pending_count(), 0);

    drop(client);
    let doc = page.join().unwrap();
    let email = doc.elements_with_attr("name", "email")[0];
    assert_eq!(doc.value(email), "a@b.com");
}

#[test]
fn tool_failure_surfaces_as_bridge_error() {
    let (client, endpoint) = connect(Duration::from_secs(5));
    let _page = BridgeHost::new(application_page()).serve(endpoint);

    match client.call(FILL_FIELDS, json!({})) {
        Err(FormPilotError::Bridge(msg)) => assert!(msg.contains("invalid input"), "{}", msg),
        other => panic!("Expected bridge error, got {:?}", other),
    }
}

#[test]
fn unanswered_call_times_out_and_late_reply_is_dropped() {
    let (client, endpoint) = connect(Duration::from_millis(50));

    let result = client.call(DETECT_FIELDS, json!({}));
    assert!(matches!(result, Err(FormPilotError::Bridge(ref m)) if m.contains("timed out")));
    assert_eq!(client.pending_count(), 0, "Timed-out call is forgotten");

    let raw = endpoint.inbound.recv().unwrap();
    let req: ToolRequest = serde_json::from_str(&raw).unwrap();
    let late = ToolResponse {
        request_id: req.request_id,
        ok: true,
        result: Some(json!("late")),
        error: None,
    };
    endpoint
        .outbound
        .send(serde_json::to_string(&late).unwrap())
        .unwrap();

    thread::sleep(Duration::from_millis(20));
    assert_eq!(client.pending_count(), 0);
}

#[test]
fn only_the_matching_response_resolves_a_call() {
    let (client, endpoint) = connect(Duration::from_secs(5));

    // Answers every request with noise, the real reply, then a duplicate.
    let responder = thread::spawn(move || {
        for raw in endpoint.inbound {
            let req: ToolRequest = match serde_json::from_str(&raw) {
                Ok(r) => r,
                Err(_) => continue,
            };
            let reply = |id: Uuid, value: &str| {
                serde_json::to_string(&ToolResponse {
                    request_id: id,
                    ok: true,
                    result: Some(json!(value)),
                    error: None,
                })
                .unwrap()
            };
            let _ = endpoint.outbound.send(reply(Uuid::new_v4(), "stranger"));
            let _ = endpoint.outbound.send("garbage".to_string());
            let _ = endpoint.outbound.send(reply(req.request_id, "right"));
            let _ = endpoint.outbound.send(reply(req.request_id, "duplicate"));
        }
    });

    assert_eq!(client.call("anything", json!({})).unwrap(), json!("right"));
    assert_eq!(client.call("anything", json!({})).unwrap(), json!("right"));
    assert_eq!(client.pending_count(), 0);

    drop(client);
    responder.join().unwrap();
}
