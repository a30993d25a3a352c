//! # CLI Command Implementations

use crate::api;
use crate::config::{STARTER_CONFIG, load_or_default};
use crate::engine::{Engine, schedule_stats_report};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sluice_core::{
    CollectingMessageHandler, CriticalContext, DeferredCleanup, FilterCatalog, OptionName,
    RewriteLevel, Scheduler, SchedulerThread, ScopeConfig, SluiceError, SystemClock,
};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn load_engine(config_path: Option<&Path>) -> Result<Engine, SluiceError> {
    Engine::from_config(load_or_default(config_path)?)
}

/// Split a comma-separated URL list, trimming and skipping empty entries.
pub fn parse_url_list(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the request scope from command-line flags.
pub fn request_scope(
    level: Option<String>,
    enable: Vec<String>,
    disable: Vec<String>,
    allow_list_only: bool,
    overrides: &[String],
) -> Result<ScopeConfig, SluiceError> {
    let mut scope = ScopeConfig {
        level,
        enable,
        disable,
        allow_list_only,
        ..ScopeConfig::default()
    };
    for entry in overrides {
        let (name, value) = entry.split_once('=').ok_or_else(|| {
            SluiceError::ConfigError(format!("Expected name=value, got '{}'", entry))
        })?;
        let option = OptionName::from_name(name.trim())?;
        scope
            .options
            .insert(option.as_str().to_string(), option.parse_value(value)?);
    }
    Ok(scope)
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server with its background dispatcher.
pub async fn cmd_server(config_path: Option<&Path>, host: &str, port: u16) -> Result<(), SluiceError> {
    let engine = Arc::new(load_engine(config_path)?);
    let interval_secs = engine.config().server.stats_report_interval_secs;

    let scheduler = Arc::new(Scheduler::new(Arc::new(SystemClock)));
    let mut cleanup = DeferredCleanup::new();
    let mut thread = SchedulerThread::new(Arc::clone(&scheduler));
    thread.start()?;
    cleanup.defer_shutdown(thread.make_deleter());

    if interval_secs > 0 {
        let interval_ms = i64::try_from(interval_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
        schedule_stats_report(&scheduler, Arc::clone(&engine), interval_ms);
    }

    println!("Sluice Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    match &engine.config().store.path {
        Some(path) => println!("  Store:    {}", path.display()),
        None => println!("  Store:    (memory)"),
    }
    println!("  Hosts:    {}", engine.config().hosts.len());
    println!();
    println!("Endpoints:");
    println!("  GET  /health   - Health check");
    println!("  GET  /filters  - Filter catalog");
    println!("  POST /resolve  - Resolve options for a host");
    println!("  GET  /critical - Critical resources for a page");
    println!("  POST /critical - Store critical resources");
    println!("  GET  /stats    - Lookup counters");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    let result = api::run_server(&addr, engine).await;
    cleanup.run_all();
    result
}

// =============================================================================
// FILTERS COMMAND
// =============================================================================

/// List the filter catalog, or one level's defaults.
pub fn cmd_filters(json_mode: bool, level: Option<&str>) -> Result<(), SluiceError> {
    let catalog = FilterCatalog::global();

    if let Some(level) = level {
        let level: RewriteLevel = level.parse()?;
        let filters: Vec<&str> = catalog.level_defaults(level).iter().map(|f| f.name()).collect();
        if json_mode {
            print_json(&serde_json::json!({ "level": level.name(), "filters": filters }));
        } else {
            println!("{} ({} filters)", level, filters.len());
            for name in filters {
                println!("  {}", name);
            }
        }
        return Ok(());
    }

    if json_mode {
        let response = api::FiltersResponse::from_catalog(catalog);
        print_json(&serde_json::to_value(&response).unwrap_or_default());
        return Ok(());
    }

    println!("Filters");
    println!("=======");
    for (name, filter) in catalog.filter_names() {
        if name == filter.name() {
            println!("  {}", name);
        } else {
            println!("  {} (alias of {})", name, filter.name());
        }
    }
    println!();
    println!("Groups");
    println!("======");
    for (name, members) in catalog.groups() {
        let members: Vec<&str> = members.iter().map(|f| f.name()).collect();
        println!("  {}: {}", name, members.join(", "));
    }
    println!();
    println!("Levels");
    println!("======");
    for level in RewriteLevel::ALL {
        println!("  {}: {} filters", level, catalog.level_defaults(level).len());
    }
    println!();
    println!("Options");
    println!("=======");
    for name in OptionName::ALL {
        println!("  {} ({:?})", name, name.policy());
    }

    Ok(())
}

// =============================================================================
// RESOLVE COMMAND
// =============================================================================

/// Resolve global, host and command-line scopes.
pub fn cmd_resolve(
    config_path: Option<&Path>,
    json_mode: bool,
    verbose: bool,
    host: &str,
    scope: &ScopeConfig,
) -> Result<(), SluiceError> {
    let config = load_or_default(config_path)?;
    let mut handler = CollectingMessageHandler::new();
    let host_options = config.options_for_host(host, &mut handler)?;
    let options = sluice_core::RewriteOptions::merge(&host_options, &scope.to_options(&mut handler)?);
    let warnings = handler.texts();

    if json_mode {
        let response = api::ResolveResponse::success(host, &options, warnings);
        print_json(&serde_json::to_value(&response).unwrap_or_default());
        return Ok(());
    }

    println!("Resolved options for {}", if host.is_empty() { "(global)" } else { host });
    println!("========================");
    println!("Level: {}", options.level());
    println!();
    println!("Enabled filters:");
    for filter in options.resolved_filters() {
        println!("  {}", filter);
    }
    if !options.explicitly_disabled().is_empty() {
        println!();
        println!("Disabled:");
        for filter in options.explicitly_disabled() {
            println!("  {}", filter);
        }
    }

    println!();
    println!("Options:");
    for name in OptionName::ALL {
        if verbose || options.option_was_set(name) {
            println!("  {} = {}", name, options.option_value(name));
        }
    }

    let lawyer = options.domain_lawyer();
    if lawyer.authorized_domains().next().is_some() {
        println!();
        println!("Domains:");
        for domain in lawyer.authorized_domains() {
            println!("  {}", domain);
        }
        for (from, to) in lawyer.rewrite_mappings() {
            println!("  {} -> {}", from, to);
        }
    }

    if !warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &warnings {
            println!("  {}", warning);
        }
    }

    Ok(())
}

// =============================================================================
// CRITICAL COMMANDS
// =============================================================================

/// Show a page's critical sets, or the raw stored payload.
pub fn cmd_critical_show(
    config_path: Option<&Path>,
    json_mode: bool,
    url: &str,
    host: &str,
    raw: bool,
) -> Result<(), SluiceError> {
    let engine = load_engine(config_path)?;

    if raw {
        let value = engine.raw_critical(url);
        let encoded = value.has_value().then(|| BASE64.encode(value.value()));
        if json_mode {
            print_json(&serde_json::json!({
                "url": url,
                "payload": encoded,
                "write_time_ms": value.write_time_ms(),
            }));
        } else {
            match encoded {
                Some(encoded) => println!("{}", encoded),
                None => println!("(absent)"),
            }
        }
        return Ok(());
    }

    let mut handler = CollectingMessageHandler::new();
    let mut request = engine.request(host, url, &mut handler)?;
    let finder = engine.finder();
    let status = finder.cache_status(&mut request);
    let html = finder.critical_set(&mut request, CriticalContext::Html).clone();
    let css = finder.critical_set(&mut request, CriticalContext::Css).clone();

    if json_mode {
        let response = api::CriticalResponse::success(url, status, &html, &css);
        print_json(&serde_json::to_value(&response).unwrap_or_default());
        return Ok(());
    }

    println!("Critical resources for {}", url);
    println!("Status: {}", status.as_str());
    for (context, set) in [(CriticalContext::Html, &html), (CriticalContext::Css, &css)] {
        println!();
        println!("{} ({}):", context, set.len());
        for resource in set {
            println!("  {}", resource);
        }
    }

    Ok(())
}

/// Store critical sets for a page. An omitted list keeps what is stored.
pub fn cmd_critical_update(
    config_path: Option<&Path>,
    json_mode: bool,
    url: &str,
    html: Option<&str>,
    css: Option<&str>,
) -> Result<(), SluiceError> {
    if html.is_none() && css.is_none() {
        return Err(SluiceError::ConfigError(
            "at least one of --html or --css is required".to_string(),
        ));
    }

    let engine = load_engine(config_path)?;
    if engine.config().store.path.is_none() {
        tracing::warn!("No store path configured, the update is lost when this process exits");
    }

    let html = html.map(parse_url_list);
    let css = css.map(parse_url_list);
    let counts = (html.as_ref().map(BTreeSet::len), css.as_ref().map(BTreeSet::len));

    if !engine.update_critical(url, html, css) {
        return Err(SluiceError::StorageError(format!(
            "critical resources for '{}' were not written",
            url
        )));
    }

    if json_mode {
        print_json(&serde_json::json!({
            "success": true,
            "url": url,
            "html": counts.0,
            "css": counts.1,
        }));
    } else {
        println!("Updated critical resources for {}", url);
        if let Some(n) = counts.0 {
            println!("  html: {} resources", n);
        }
        if let Some(n) = counts.1 {
            println!("  css:  {} resources", n);
        }
    }

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Write the starter configuration.
pub fn cmd_init(output: &Path, force: bool) -> Result<(), SluiceError> {
    if output.exists() && !force {
        return Err(SluiceError::IoError(format!(
            "'{}' already exists. Use --force to overwrite.",
            output.display()
        )));
    }

    std::fs::write(output, STARTER_CONFIG).map_err(|e| {
        SluiceError::IoError(format!("Cannot write '{}': {}", output.display(), e))
    })?;

    println!("Wrote starter configuration to {}", output.display());
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
