//! # Configuration Model
//!
//! The serde model of a sluice configuration and its application onto
//! [`RewriteOptions`]. Parsing the file format is the application's job;
//! this module only sees already-deserialized values.
//!
//! ```text
//! [store]             property store location and cohorts
//! [global]            scope applied to every host
//! [hosts."a.com"]     scope layered on top of [global]
//! [server]            dispatcher settings
//! ```
//!
//! Problems with individual entries are reported to a [`MessageHandler`]
//! and the rest of the scope still applies, the same way filter lists
//! behave. Only structurally invalid values return an error.

use crate::filters::RewriteLevel;
use crate::options::{OptionName, RewriteOptions, ScalarValue};
use crate::primitives::DEFAULT_CRITICAL_COHORT;
use crate::{MessageHandler, SluiceError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SluiceConfig {
    pub store: StoreConfig,
    pub global: ScopeConfig,
    pub hosts: BTreeMap<String, ScopeConfig>,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// redb database file; `None` keeps properties in memory.
    pub path: Option<PathBuf>,
    pub cohorts: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            cohorts: vec![DEFAULT_CRITICAL_COHORT.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Interval of the periodic statistics report; 0 disables it.
    pub stats_report_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            stats_report_interval_secs: 300,
        }
    }
}

/// One ordered allow/disallow rule for resource URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceRule {
    Allow(String),
    Disallow(String),
}

/// Settings for one configuration scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScopeConfig {
    pub level: Option<String>,
    /// Comma-separated filter lists, applied in order.
    pub enable: Vec<String>,
    pub disable: Vec<String>,
    /// Disable every filter not explicitly enabled in this scope.
    pub allow_list_only: bool,
    pub options: BTreeMap<String, ScalarValue>,
    pub domains: Vec<String>,
    /// Target domain -> source domains.
    pub rewrite_domains: BTreeMap<String, Vec<String>>,
    /// URL prefix -> filesystem prefix.
    pub load_from_file: BTreeMap<String, String>,
    pub resources: Vec<ResourceRule>,
    pub retain_comments: Vec<String>,
}

impl ScopeConfig {
    /// Apply this scope to `options`.
    ///
    /// Returns false if any entry produced a diagnostic. Errors are reserved
    /// for values that cannot be interpreted at all (bad level, ill-typed
    /// option, malformed wildcard).
    pub fn apply(
        &self,
        options: &mut RewriteOptions,
        handler: &mut dyn MessageHandler,
    ) -> Result<bool, SluiceError> {
        let mut ok = true;

        if let Some(level) = &self.level {
            let level: RewriteLevel = level.parse()?;
            options.set_rewrite_level(level);
        }
        for list in &self.enable {
            ok &= options.enable_filters_by_list(list, handler);
        }
        for list in &self.disable {
            ok &= options.disable_filters_by_list(list, handler);
        }
        if self.allow_list_only {
            options.lock_to_explicit_allow_list();
        }

        for (name, value) in &self.options {
            options.set_option(OptionName::from_name(name)?, value)?;
        }

        for domain in &self.domains {
            ok &= options.domain_lawyer_mut().add_domain(domain, handler);
        }
        for (to, from) in &self.rewrite_domains {
            ok &= options
                .domain_lawyer_mut()
                .add_rewrite_domain_mapping(to, &from.join(","), handler);
        }
        for (url_prefix, file_prefix) in &self.load_from_file {
            options
                .file_load_policy_mut()
                .associate(url_prefix, file_prefix)?;
        }
        for rule in &self.resources {
            match rule {
                ResourceRule::Allow(spec) => options.allow_resource(spec)?,
                ResourceRule::Disallow(spec) => options.disallow_resource(spec)?,
            }
        }
        for spec in &self.retain_comments {
            options.retain_comment(spec)?;
        }

        Ok(ok)
    }

    /// A fresh snapshot holding only this scope.
    pub fn to_options(&self, handler: &mut dyn MessageHandler) -> Result<RewriteOptions, SluiceError> {
        let mut options = RewriteOptions::new();
        self.apply(&mut options, handler)?;
        Ok(options)
    }
}

impl SluiceConfig {
    /// Apply every scope once, reporting diagnostics to `handler`.
    ///
    /// Returns false if any scope produced a diagnostic, and the first error
    /// if a scope cannot be interpreted.
    pub fn validate(&self, handler: &mut dyn MessageHandler) -> Result<bool, SluiceError> {
        let mut ok = self.global.apply(&mut RewriteOptions::new(), handler)?;
        for (host, scope) in &self.hosts {
            ok &= scope
                .apply(&mut RewriteOptions::new(), handler)
                .map_err(|e| SluiceError::ConfigError(format!("[hosts.\"{}\"]: {}", host, e)))?;
        }
        Ok(ok)
    }

    /// Options of the global scope alone.
    pub fn global_options(&self, handler: &mut dyn MessageHandler) -> Result<RewriteOptions, SluiceError> {
        self.global.to_options(handler)
    }

    /// Global options with `host`'s scope layered on top, if it has one.
    pub fn options_for_host(
        &self,
        host: &str,
        handler: &mut dyn MessageHandler,
    ) -> Result<RewriteOptions, SluiceError> {
        let global = self.global_options(handler)?;
        match self.host_scope(host) {
            Some(scope) => Ok(RewriteOptions::merge(&global, &scope.to_options(handler)?)),
            None => Ok(global),
        }
    }

    /// The scope configured for `host`. Host names compare ASCII
    /// case-insensitively on both sides.
    #[must_use]
    pub fn host_scope(&self, host: &str) -> Option<&ScopeConfig> {
        self.hosts
            .get(host)
            .or_else(|| {
                self.hosts
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(host))
                    .map(|(_, scope)| scope)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollectingMessageHandler;
    use crate::filters::Filter;

    fn scope() -> ScopeConfig {
        ScopeConfig {
            level: Some("corefilters".to_string()),
            enable: vec!["remove_comments".to_string()],
            disable: vec!["combine_css,bogus".to_string()],
            options: [("css_inline_max_bytes".to_string(), ScalarValue::Int(512))].into(),
            resources: vec![ResourceRule::Disallow("*.pdf".to_string())],
            retain_comments: vec!["keep*".to_string()],
            ..ScopeConfig::default()
        }
    }

    #[test]
    fn scope_applies_with_diagnostics() {
        let mut handler = CollectingMessageHandler::new();
        let mut options = RewriteOptions::new();
        let ok = scope().apply(&mut options, &mut handler).expect("apply");

        assert!(!ok);
        assert_eq!(handler.texts(), vec!["Invalid filter name: bogus"]);
        assert_eq!(options.level(), RewriteLevel::CoreFilters);
        assert!(options.enabled(Filter::RemoveComments));
        assert!(!options.enabled(Filter::CombineCss));
        assert_eq!(options.css_inline_max_bytes(), 512);
        assert!(!options.is_allowed("http://a.com/x.pdf"));
        assert!(options.is_retained_comment("keep this"));
    }

    #[test]
    fn bad_level_is_an_error() {
        let scope = ScopeConfig {
            level: Some("everything".to_string()),
            ..ScopeConfig::default()
        };
        let mut handler = CollectingMessageHandler::new();
        assert!(matches!(
            scope.to_options(&mut handler),
            Err(SluiceError::InvalidRewriteLevel(_))
        ));
    }

    #[test]
    fn unknown_option_is_an_error() {
        let scope = ScopeConfig {
            options: [("no_such".to_string(), ScalarValue::Bool(true))].into(),
            ..ScopeConfig::default()
        };
        let mut handler = CollectingMessageHandler::new();
        assert!(matches!(
            scope.to_options(&mut handler),
            Err(SluiceError::UnknownOption(_))
        ));
    }

    #[test]
    fn allow_list_only_locks_scope() {
        let scope = ScopeConfig {
            level: Some("AllFilters".to_string()),
            enable: vec!["add_head".to_string()],
            allow_list_only: true,
            ..ScopeConfig::default()
        };
        let mut handler = CollectingMessageHandler::new();
        let options = scope.to_options(&mut handler).expect("apply");
        assert_eq!(options.resolved_filters().len(), 1);
    }

    #[test]
    fn host_scope_layers_on_global() {
        let mut config = SluiceConfig {
            global: scope(),
            ..SluiceConfig::default()
        };
        config.hosts.insert(
            "shop.example.com".to_string(),
            ScopeConfig {
                enable: vec!["combine_css".to_string()],
                options: [("css_inline_max_bytes".to_string(), ScalarValue::Int(64))].into(),
                ..ScopeConfig::default()
            },
        );
        let mut handler = CollectingMessageHandler::new();

        let host = config
            .options_for_host("Shop.Example.com", &mut handler)
            .expect("resolve");
        assert!(host.enabled(Filter::CombineCss));
        assert_eq!(host.css_inline_max_bytes(), 64);
        assert_eq!(host.level(), RewriteLevel::CoreFilters);

        let other = config.options_for_host("other.com", &mut handler).expect("resolve");
        assert!(!other.enabled(Filter::CombineCss));
        assert_eq!(other.css_inline_max_bytes(), 512);
    }

    #[test]
    fn validate_reports_every_scope() {
        let mut config = SluiceConfig {
            global: scope(),
            ..SluiceConfig::default()
        };
        config.hosts.insert(
            "b.com".to_string(),
            ScopeConfig {
                enable: vec!["no_such_filter".to_string()],
                ..ScopeConfig::default()
            },
        );
        let mut handler = CollectingMessageHandler::new();
        assert!(!config.validate(&mut handler).expect("validate"));
        assert_eq!(
            handler.texts(),
            vec!["Invalid filter name: bogus", "Invalid filter name: no_such_filter"]
        );

        config.hosts.insert(
            "c.com".to_string(),
            ScopeConfig {
                level: Some("Fastest".to_string()),
                ..ScopeConfig::default()
            },
        );
        let err = config.validate(&mut handler).expect_err("bad level");
        assert!(err.to_string().contains("c.com"));
    }

    #[test]
    fn mixed_case_host_key_matches_any_case() {
        let mut config = SluiceConfig::default();
        config.hosts.insert(
            "Shop.Example.com".to_string(),
            ScopeConfig {
                enable: vec!["combine_css".to_string()],
                ..ScopeConfig::default()
            },
        );
        let mut handler = CollectingMessageHandler::new();

        for host in ["Shop.Example.com", "shop.example.com", "SHOP.EXAMPLE.COM"] {
            let options = config.options_for_host(host, &mut handler).expect("resolve");
            assert!(options.enabled(Filter::CombineCss), "host {host}");
        }
        let other = config.options_for_host("example.com", &mut handler).expect("resolve");
        assert!(!other.enabled(Filter::CombineCss));
    }

    #[test]
    fn defaults_register_the_critical_cohort() {
        let config = SluiceConfig::default();
        assert_eq!(config.store.cohorts, vec![DEFAULT_CRITICAL_COHORT]);
        assert!(config.store.path.is_none());
    }
}
