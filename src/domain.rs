//! Runtime-mutable mapping between modules and virtual-host domains.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::{info, warn};

/// Concurrency-safe mapping from module name to domain string, consulted on
/// every dispatch.
///
/// This is the single source of truth for both dispatch branches: a module
/// present here is reachable by virtual host and *not* by path prefix, and
/// vice versa. Both directions of the mapping live under one lock so they
/// can never disagree. Reads take the read lock on the dispatch hot path;
/// writes are rare administrative operations.
#[derive(Default)]
pub struct DomainRegistry {
    inner: RwLock<DomainTable>,
}

#[derive(Default)]
struct DomainTable {
    by_module: HashMap<String, String>,
    by_domain: HashMap<String, String>,
}

impl DomainRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `module` to `domain`, replacing any previous binding of the
    /// module. An empty domain unbinds. If another module already holds the
    /// domain, that module is evicted: last write wins.
    ///
    /// Takes effect for the next dispatch; in-flight dispatches that already
    /// resolved keep their resolution.
    pub(crate) fn bind(&self, module: &str, domain: &str) {
        let mut table = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(old) = table.by_module.remove(module) {
            table.by_domain.remove(&old);
        }
        if domain.is_empty() {
            info!(module = %module, "domain unbound, prefix dispatch restored");
            return;
        }

        if let Some(evicted) = table
            .by_domain
            .insert(domain.to_string(), module.to_string())
        {
            table.by_module.remove(&evicted);
            warn!(domain = %domain, module = %module, evicted = %evicted, "domain rebound, previous owner evicted");
        }
        table.by_module.insert(module.to_string(), domain.to_string());
        info!(module = %module, domain = %domain, "domain bound");
    }

    /// Module bound to `host`, compared by exact string equality (including
    /// any port), or `None`.
    #[must_use]
    pub fn module_for(&self, host: &str) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_domain
            .get(host)
            .cloned()
    }

    /// Domain currently bound to `module`, or `None`.
    #[must_use]
    pub fn domain_of(&self, module: &str) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_module
            .get(module)
            .cloned()
    }

    /// Whether `module` currently has a domain binding (and is therefore
    /// excluded from path-prefix dispatch).
    #[must_use]
    pub fn is_bound(&self, module: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_module
            .contains_key(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_unbind() {
        let reg = DomainRegistry::new();
        reg.bind("blog", "blog.example:80");
        assert_eq!(reg.module_for("blog.example:80").as_deref(), Some("blog"));
        assert_eq!(reg.domain_of("blog").as_deref(), Some("blog.example:80"));
        assert!(reg.is_bound("blog"));

        reg.bind("blog", "");
        assert_eq!(reg.module_for("blog.example:80"), None);
        assert!(!reg.is_bound("blog"));
    }

    #[test]
    fn rebinding_module_releases_old_domain() {
        let reg = DomainRegistry::new();
        reg.bind("blog", "old.example");
        reg.bind("blog", "new.example");
        assert_eq!(reg.module_for("old.example"), None);
        assert_eq!(reg.module_for("new.example").as_deref(), Some("blog"));
    }

    #[test]
    fn last_write_wins_across_modules() {
        let reg = DomainRegistry::new();
        reg.bind("blog", "shared.example");
        reg.bind("wiki", "shared.example");
        assert_eq!(reg.module_for("shared.example").as_deref(), Some("wiki"));
        // The evicted module is fully unbound, not half-mapped.
        assert!(!reg.is_bound("blog"));
        assert_eq!(reg.domain_of("blog"), None);
    }

    #[test]
    fn exact_string_comparison_includes_port() {
        let reg = DomainRegistry::new();
        reg.bind("blog", "blog.example:80");
        assert_eq!(reg.module_for("blog.example"), None);
        assert_eq!(reg.module_for("blog.example:8080"), None);
    }
}
