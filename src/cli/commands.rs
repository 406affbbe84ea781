use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::bridge::tools::tool_specs;
use crate::cli::config::{AppConfig, ContextAction, ProfileAction, resolve_base_url};
use crate::detect::detector::{DetectionSession, detect_fields};
use crate::dom::snapshot::{load_snapshot, save_snapshot};
use crate::error::{FormPilotError, Result};
use crate::fill_page;
use crate::mapping::resolver::MappingResolver;
use crate::mapping::service::{HttpMappingService, MappingService, UnavailableService};
use crate::store::local_store::LocalStore;
use crate::trace::logger::TraceLogger;

/// Settings shared by every subcommand after CLI and config are merged.
pub struct Runtime {
    pub config: AppConfig,
    pub api_base_url: Option<String>,
}

impl Runtime {
    pub fn new(config: AppConfig, api_base_url: Option<String>) -> Self {
        Self { config, api_base_url }
    }

    pub fn open_store(&self) -> LocalStore {
        LocalStore::open(&self.config.store.path)
    }

    pub fn base_url(&self, store: &LocalStore) -> String {
        resolve_base_url(
            self.api_base_url.as_deref(),
            &self.config,
            store.load_api_base_url().as_deref(),
        )
    }

    fn http_service(&self, store: &LocalStore) -> Result<HttpMappingService> {
        let base_url = self.base_url(store);
        Ok(HttpMappingService::new(&base_url, self.config.service_timeout())?)
    }

    /// The remote service, or an always-failing stand-in when offline or
    /// when the HTTP client cannot be built.
    fn mapping_service(&self, store: &LocalStore, offline: bool) -> Box<dyn MappingService> {
        if offline {
            return Box::new(UnavailableService);
        }
        match self.http_service(store) {
            Ok(service) => Box::new(service),
            Err(e) => {
                tracing::warn!(error = %e, "mapping service unavailable; running offline");
                Box::new(UnavailableService)
            }
        }
    }

    fn tracer(&self) -> TraceLogger {
        TraceLogger::open(self.config.trace.path.as_deref())
    }
}

fn print_json<T: Serialize>(value: &T, what: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| FormPilotError::JsonSerialize {
        context: what.to_string(),
        source: e,
    })?;
    println!("{}", json);
    Ok(())
}

// ============================================================================
// detect subcommand
// ============================================================================

pub fn cmd_detect(page: &Path) -> Result<()> {
    let mut doc = load_snapshot(page)?;
    let fields = detect_fields(&mut doc);
    tracing::info!(count = fields.len(), "detected fields");
    print_json(&fields, "detected fields")
}

// ============================================================================
// fill subcommand
// ============================================================================

pub fn cmd_fill(
    runtime: &Runtime,
    page: &Path,
    out: Option<&Path>,
    clear_wrong: bool,
    offline: bool,
) -> Result<()> {
    let mut doc = load_snapshot(page)?;
    let store = runtime.open_store();
    let service = runtime.mapping_service(&store, offline);
    let mut resolver = MappingResolver::new(service, store, runtime.config.cache_ttl());
    let mut session = DetectionSession::new();
    let tracer = runtime.tracer();

    let outcome = fill_page(&mut doc, &mut session, &mut resolver, clear_wrong, &tracer);
    println!("{}", outcome.status);
    for violation in outcome.validation.violations.iter().filter(|v| !v.cleared) {
        println!(
            "  {} [{}]: expected {:?}, found {:?}",
            violation.label, violation.reason, violation.expected, violation.actual
        );
    }

    if runtime.config.usage.consent && !offline && outcome.fill.filled > 0 {
        let usage = runtime.http_service(resolver.store());
        if let Err(e) = usage.and_then(|s| {
            s.record_fill(outcome.fill.filled)
                .map_err(FormPilotError::from)
        }) {
            tracing::warn!(error = %e, "could not record fill usage");
        }
    }

    let out_path: PathBuf = out.map(Path::to_path_buf).unwrap_or_else(|| page.to_path_buf());
    save_snapshot(&doc, &out_path)?;
    tracing::info!(path = %out_path.display(), "wrote filled snapshot");
    Ok(())
}

// ============================================================================
// suggest subcommand
// ============================================================================

pub fn cmd_suggest(runtime: &Runtime, page: &Path, field_index: usize) -> Result<()> {
    let mut doc = load_snapshot(page)?;
    let fields = detect_fields(&mut doc);
    let target = fields
        .iter()
        .find(|f| f.index == field_index)
        .ok_or_else(|| FormPilotError::FieldNotFound {
            index: field_index,
            context: format!("{} detected fields in {}", fields.len(), page.display()),
        })?;

    let store = runtime.open_store();
    let service = runtime.mapping_service(&store, false);
    let mut resolver = MappingResolver::new(service, store, runtime.config.cache_ttl());
    let suggestion = resolver.suggest_for_field(target, &fields);
    print_json(&suggestion, "field suggestion")
}

// ============================================================================
// profile / context subcommands
// ============================================================================

pub fn cmd_profile(runtime: &Runtime, action: &ProfileAction) -> Result<()> {
    let mut store = runtime.open_store();
    match action {
        ProfileAction::Show => print_json(&store.load_profile(), "profile"),
        ProfileAction::Set { key, value } => {
            let mut profile = store.load_profile();
            profile.set(key, value);
            store.save_profile(&profile)?;
            println!("Saved {}", key);
            Ok(())
        }
        ProfileAction::Import { url } => {
            let service = runtime.http_service(&store)?;
            let imported = service.import_from_url(url)?;
            let fresh = imported.profile.non_empty();
            let mut profile = store.load_profile();
            for (key, value) in fresh.entries() {
                profile.set(key, value);
            }
            store.save_profile(&profile)?;
            if !imported.context.trim().is_empty() {
                store.save_context(imported.context.trim())?;
            }
            println!("Imported {} profile values from {}", fresh.entries().count(), url);
            Ok(())
        }
    }
}

pub fn cmd_context(runtime: &Runtime, action: &ContextAction) -> Result<()> {
    let mut store = runtime.open_store();
    match action {
        ContextAction::Show => {
            println!("{}", store.load_context());
            Ok(())
        }
        ContextAction::Set { text } => {
            store.save_context(text)?;
            println!("Saved context");
            Ok(())
        }
    }
}

// ============================================================================
// health subcommand
// ============================================================================

pub fn cmd_health(runtime: &Runtime) -> Result<()> {
    let store = runtime.open_store();
    let service = runtime.http_service(&store)?;
    match service.health() {
        Ok(true) => println!("{}: ok", service.base_url()),
        Ok(false) => println!("{}: degraded", service.base_url()),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            println!("{}: unreachable ({})", service.base_url(), e);
        }
    }
    Ok(())
}

// ============================================================================
// tools subcommand
// ============================================================================

pub fn cmd_tools() -> Result<()> {
    print_json(&tool_specs(), "tool declarations")
}
