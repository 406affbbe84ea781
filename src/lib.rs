use serde::Serialize;

use crate::{
    detect::{detector::DetectionSession, field_model::Field},
    dom::document::Document,
    fill::executor::{FillReport, apply_mappings},
    mapping::{
        mapping_model::{Mapping, ResolutionSource},
        resolver::MappingResolver,
    },
    trace::{
        event::{Stage, TraceEvent},
        logger::TraceLogger,
    },
    validate::{report_model::ValidationReport, validator::validate_fill},
};

pub mod bridge;
pub mod cli;
pub mod detect;
pub mod dom;
pub mod error;
pub mod fill;
pub mod mapping;
pub mod selector;
pub mod store;
pub mod trace;
pub mod validate;

/// Everything one "Fill form" run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillOutcome {
    pub fields: Vec<Field>,
    pub source: Option<ResolutionSource>,
    pub mappings: Vec<Mapping>,
    pub fill: FillReport,
    pub validation: ValidationReport,
    pub status: String,
}

/// Detect, resolve, fill, then validate the page.
///
/// Never fails: a dead mapping service degrades to local heuristics and a
/// page without fields produces an empty outcome.
pub fn fill_page(
    doc: &mut Document,
    session: &mut DetectionSession,
    resolver: &mut MappingResolver,
    clear_wrong: bool,
    tracer: &TraceLogger,
) -> FillOutcome {
    let fields = session.scan(doc);
    tracer.log(&TraceEvent::now(Stage::Detect, fields.len()));

    if fields.is_empty() {
        tracing::info!("no fillable fields on page");
        return FillOutcome {
            fields,
            source: None,
            mappings: vec![],
            fill: FillReport::default(),
            validation: validate_fill(doc, &[], &[], clear_wrong),
            status: "No fillable fields found".to_string(),
        };
    }

    let resolution = resolver.resolve_batch(&fields);
    tracer.log(
        &TraceEvent::now(Stage::Resolve, fields.len())
            .with_source(resolution.source)
            .with_note(format!("{} mappings", resolution.mappings.len())),
    );

    let fill = apply_mappings(doc, &resolution.mappings);
    tracer.log(&TraceEvent::now(Stage::Fill, fields.len()).with_filled(fill.filled));

    let validation = validate_fill(doc, &fields, &fill.applied, clear_wrong);
    tracer.log(
        &TraceEvent::now(Stage::Validate, fields.len())
            .with_filled(fill.filled)
            .with_violations(validation.violations.len()),
    );

    let status = validation.status_line(fill.filled);
    tracing::info!(source = %resolution.source, filled = fill.filled, "{}", status);

    FillOutcome {
        fields,
        source: Some(resolution.source),
        mappings: resolution.mappings,
        fill,
        validation,
        status,
    }
}
