//! # Domain and File-Load Sub-Configurations
//!
//! Both absorb other instances one side at a time: merging a layered pair
//! means `merge(first)` followed by `merge(second)`, never a combined pass.

use super::wildcard::Wildcard;
use crate::{MessageHandler, SluiceError};
use std::collections::BTreeMap;

// =============================================================================
// DOMAIN LAWYER
// =============================================================================

/// Authorised domains and rewrite-domain mappings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainLawyer {
    /// Normalised spec -> compiled pattern.
    authorized: BTreeMap<String, Wildcard>,
    /// Source domain -> target domain.
    rewrite_map: BTreeMap<String, String>,
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('/').to_ascii_lowercase()
}

impl DomainLawyer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Authorise a domain (wildcards allowed) for rewriting.
    pub fn add_domain(&mut self, spec: &str, handler: &mut dyn MessageHandler) -> bool {
        let key = normalize_domain(spec);
        if key.is_empty() {
            handler.warning("Empty domain pattern");
            return false;
        }
        if self.authorized.contains_key(&key) {
            return true;
        }
        match Wildcard::new(&key) {
            Ok(pattern) => {
                self.authorized.insert(key, pattern);
                true
            }
            Err(e) => {
                handler.warning(&e.to_string());
                false
            }
        }
    }

    /// Map every domain in the comma-separated `from_list` onto `to`.
    ///
    /// Both sides become authorised. Wildcard targets are rejected; a bad
    /// source is reported and skipped while the rest still apply.
    pub fn add_rewrite_domain_mapping(
        &mut self,
        to: &str,
        from_list: &str,
        handler: &mut dyn MessageHandler,
    ) -> bool {
        let target = normalize_domain(to);
        if target.is_empty() || target.contains(['*', '?']) {
            handler.warning(&format!("Invalid rewrite target domain: {}", to));
            return false;
        }
        let mut ok = self.add_domain(&target, handler);
        for from in from_list.split(',').map(normalize_domain) {
            if from.is_empty() {
                continue;
            }
            if from.contains(['*', '?']) {
                handler.warning(&format!("Wildcard source in rewrite mapping: {}", from));
                ok = false;
                continue;
            }
            ok &= self.add_domain(&from, handler);
            self.rewrite_map.insert(from, target.clone());
        }
        ok
    }

    /// Whether `domain` matches any authorised pattern.
    #[must_use]
    pub fn is_domain_authorized(&self, domain: &str) -> bool {
        let domain = normalize_domain(domain);
        self.authorized.values().any(|pattern| pattern.matches(&domain))
    }

    /// Target domain for `domain`, if a mapping exists.
    #[must_use]
    pub fn rewrite_domain(&self, domain: &str) -> Option<&str> {
        self.rewrite_map
            .get(&normalize_domain(domain))
            .map(String::as_str)
    }

    pub fn authorized_domains(&self) -> impl Iterator<Item = &str> {
        self.authorized.keys().map(String::as_str)
    }

    pub fn rewrite_mappings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rewrite_map
            .iter()
            .map(|(from, to)| (from.as_str(), to.as_str()))
    }

    /// Absorb `src`'s rules. Mappings from `src` replace existing ones for
    /// the same source.
    pub fn merge(&mut self, src: &DomainLawyer) {
        for (key, pattern) in &src.authorized {
            self.authorized
                .entry(key.clone())
                .or_insert_with(|| pattern.clone());
        }
        for (from, to) in &src.rewrite_map {
            self.rewrite_map.insert(from.clone(), to.clone());
        }
    }
}

// =============================================================================
// FILE LOAD POLICY
// =============================================================================

/// Routes resource URLs to the local filesystem by prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileLoadPolicy {
    /// (url prefix, filename prefix), in insertion order.
    prefixes: Vec<(String, String)>,
}

fn with_trailing_slash(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}

impl FileLoadPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve URLs under `url_prefix` from files under `filename_prefix`.
    pub fn associate(&mut self, url_prefix: &str, filename_prefix: &str) -> Result<(), SluiceError> {
        if url_prefix.trim().is_empty() || filename_prefix.trim().is_empty() {
            return Err(SluiceError::ConfigError(
                "File load association needs both a URL and a filename prefix".to_string(),
            ));
        }
        self.prefixes.push((
            with_trailing_slash(url_prefix.trim()),
            with_trailing_slash(filename_prefix.trim()),
        ));
        Ok(())
    }

    /// Filename for `url`; the most recently added matching prefix wins.
    #[must_use]
    pub fn should_load_from_file(&self, url: &str) -> Option<String> {
        self.prefixes
            .iter()
            .rev()
            .find_map(|(url_prefix, file_prefix)| {
                url.strip_prefix(url_prefix.as_str())
                    .map(|rest| format!("{}{}", file_prefix, rest))
            })
    }

    pub fn associations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(u, f)| (u.as_str(), f.as_str()))
    }

    /// Append `other`'s associations after the existing ones.
    pub fn merge(&mut self, other: &FileLoadPolicy) {
        self.prefixes.extend(other.prefixes.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollectingMessageHandler;

    #[test]
    fn wildcard_domain_authorization() {
        let mut lawyer = DomainLawyer::new();
        let mut handler = CollectingMessageHandler::new();
        assert!(lawyer.add_domain("*.Example.com", &mut handler));

        assert!(lawyer.is_domain_authorized("cdn.example.com"));
        assert!(!lawyer.is_domain_authorized("example.org"));
        assert!(handler.is_empty());
    }

    #[test]
    fn rewrite_mapping_authorizes_both_sides() {
        let mut lawyer = DomainLawyer::new();
        let mut handler = CollectingMessageHandler::new();
        assert!(lawyer.add_rewrite_domain_mapping("cdn.com", "a.com, b.com", &mut handler));

        assert_eq!(lawyer.rewrite_domain("A.com"), Some("cdn.com"));
        assert_eq!(lawyer.rewrite_domain("b.com"), Some("cdn.com"));
        assert!(lawyer.is_domain_authorized("cdn.com"));
        assert!(lawyer.is_domain_authorized("a.com"));
    }

    #[test]
    fn wildcard_mapping_source_is_partial_failure() {
        let mut lawyer = DomainLawyer::new();
        let mut handler = CollectingMessageHandler::new();
        assert!(!lawyer.add_rewrite_domain_mapping("cdn.com", "*.a.com,b.com", &mut handler));

        assert_eq!(lawyer.rewrite_domain("b.com"), Some("cdn.com"));
        assert_eq!(handler.messages().len(), 1);
    }

    #[test]
    fn merge_second_mapping_wins() {
        let mut handler = CollectingMessageHandler::new();
        let mut first = DomainLawyer::new();
        first.add_rewrite_domain_mapping("one.com", "src.com", &mut handler);
        let mut second = DomainLawyer::new();
        second.add_rewrite_domain_mapping("two.com", "src.com", &mut handler);

        let mut merged = DomainLawyer::new();
        merged.merge(&first);
        merged.merge(&second);
        assert_eq!(merged.rewrite_domain("src.com"), Some("two.com"));
        assert!(merged.is_domain_authorized("one.com"));
    }

    #[test]
    fn latest_file_association_wins() {
        let mut policy = FileLoadPolicy::new();
        policy
            .associate("http://a.com/static", "/var/www/static")
            .expect("associate");
        policy
            .associate("http://a.com/static/img/", "/srv/img/")
            .expect("associate");

        assert_eq!(
            policy.should_load_from_file("http://a.com/static/img/x.png"),
            Some("/srv/img/x.png".to_string())
        );
        assert_eq!(
            policy.should_load_from_file("http://a.com/static/app.js"),
            Some("/var/www/static/app.js".to_string())
        );
        assert_eq!(policy.should_load_from_file("http://b.com/static/app.js"), None);
    }

    #[test]
    fn file_policy_merge_appends() {
        let mut first = FileLoadPolicy::new();
        first.associate("http://a.com/", "/a/").expect("associate");
        let mut second = FileLoadPolicy::new();
        second.associate("http://a.com/", "/b/").expect("associate");

        let mut merged = FileLoadPolicy::new();
        merged.merge(&first);
        merged.merge(&second);
        assert_eq!(merged.associations().count(), 2);
        assert_eq!(
            merged.should_load_from_file("http://a.com/x"),
            Some("/b/x".to_string())
        );
    }

    #[test]
    fn empty_association_rejected() {
        let mut policy = FileLoadPolicy::new();
        assert!(policy.associate("", "/x").is_err());
    }
}
