use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::detect::detector::DetectionSession;
use crate::detect::field_model::Field;
use crate::dom::document::Document;
use crate::fill::executor::apply_mappings;
use crate::mapping::mapping_model::Mapping;
use crate::validate::validator::validate_fill;

pub const DETECT_FIELDS: &str = "detect_fields";
pub const FILL_FIELDS: &str = "fill_fields";
pub const VALIDATE_FILL: &str = "validate_fill";

/// Declaration of one externally invocable operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

fn mapping_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "index": { "type": "integer", "minimum": 0 },
            "selector": {
                "description": "CSS selector string or {kind, value} locator"
            },
            "value": { "type": "string" }
        },
        "required": ["value"]
    })
}

pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: DETECT_FIELDS,
            description: "Detect fillable form fields on the page with their semantic types.",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolSpec {
            name: FILL_FIELDS,
            description: "Write values into form fields, dispatching input and change events.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "mappings": { "type": "array", "items": mapping_schema() }
                },
                "required": ["mappings"]
            }),
        },
        ToolSpec {
            name: VALIDATE_FILL,
            description: "Re-read filled fields and report values that did not stick or are not URLs.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "mappings": { "type": "array", "items": mapping_schema() },
                    "clearWrong": { "type": "boolean", "default": false }
                },
                "required": ["mappings"]
            }),
        },
    ]
}

#[derive(Debug, Deserialize)]
struct FillInput {
    mappings: Vec<Mapping>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateInput {
    mappings: Vec<Mapping>,
    #[serde(default)]
    clear_wrong: bool,
}

/// Page-side state the tools operate on.
#[derive(Debug, Default)]
pub struct ToolContext {
    pub detection: DetectionSession,
    pub last_fields: Vec<Field>,
}

/// Run a named tool against the page. Errors are messages for the caller,
/// never panics.
pub fn invoke_tool(
    doc: &mut Document,
    ctx: &mut ToolContext,
    tool: &str,
    input: &Value,
) -> Result<Value, String> {
    match tool {
        DETECT_FIELDS => {
            ctx.last_fields = ctx.detection.scan(doc);
            Ok(json!({ "fields": ctx.last_fields }))
        }
        FILL_FIELDS => {
            let input: FillInput = serde_json::from_value(input.clone())
                .map_err(|e| format!("invalid input for {}: {}", FILL_FIELDS, e))?;
            let report = apply_mappings(doc, &input.mappings);
            Ok(json!({ "filled": report.filled, "skipped": report.skipped }))
        }
        VALIDATE_FILL => {
            let input: ValidateInput = serde_json::from_value(input.clone())
                .map_err(|e| format!("invalid input for {}: {}", VALIDATE_FILL, e))?;
            if ctx.last_fields.is_empty() {
                ctx.last_fields = ctx.detection.scan(doc);
            }
            let report = validate_fill(doc, &ctx.last_fields, &input.mappings, input.clear_wrong);
            serde_json::to_value(report).map_err(|e| e.to_string())
        }
        other => Err(format!("unknown tool '{}'", other)),
    }
}
