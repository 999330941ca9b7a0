//! Per-compilation state shared by every node of one query tree.
//!
//! [`CompilationContext`] owns the alias namespace: every alias it hands out
//! is distinct from all aliases previously issued or reserved in the same
//! compilation. It is passed explicitly to the operations that allocate
//! names, so independent compilations never observe each other.

use std::collections::{HashMap, HashSet};

use super::errors::{IrError, IrResult};
use crate::config::IrConfig;
use crate::utils::alias_naming::next_free_name;

#[derive(Debug, Clone, Default)]
pub struct CompilationContext {
    config: IrConfig,
    /// Every alias issued or reserved so far
    issued: HashSet<String>,
    /// Next numeric suffix to try, per base name
    counters: HashMap<String, usize>,
}

impl CompilationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: IrConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &IrConfig {
        &self.config
    }

    /// Hand out a fresh alias built from `prefix`: the bare prefix when it
    /// is still free, then `prefix0`, `prefix1`, ...
    pub fn create_unique_alias(&mut self, prefix: &str) -> IrResult<String> {
        if prefix.is_empty() {
            return Err(IrError::EmptyAliasPrefix);
        }

        let start = self.counters.get(prefix).copied().unwrap_or(0);
        let (alias, next) = next_free_name(prefix, start, |candidate| {
            self.issued.contains(candidate)
        });
        self.counters.insert(prefix.to_string(), next);
        self.issued.insert(alias.clone());

        log::trace!("CompilationContext: issued alias '{}'", alias);
        Ok(alias)
    }

    /// Alias for a subquery produced by push-down.
    pub fn create_subquery_alias(&mut self) -> IrResult<String> {
        let prefix = self.config.subquery_alias_prefix.clone();
        self.create_unique_alias(&prefix)
    }

    /// Record an alias chosen by the caller (e.g. a base table alias) so
    /// that generated aliases never collide with it.
    pub fn reserve_alias(&mut self, alias: impl Into<String>) {
        self.issued.insert(alias.into());
    }

    pub fn is_issued(&self, alias: &str) -> bool {
        self.issued.contains(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_are_unique_per_prefix() {
        let mut ctx = CompilationContext::new();
        assert_eq!(ctx.create_unique_alias("t").unwrap(), "t");
        assert_eq!(ctx.create_unique_alias("t").unwrap(), "t0");
        assert_eq!(ctx.create_unique_alias("t").unwrap(), "t1");
        assert_eq!(ctx.create_unique_alias("c").unwrap(), "c");
    }

    #[test]
    fn test_reserved_aliases_are_skipped() {
        let mut ctx = CompilationContext::new();
        ctx.reserve_alias("t");
        ctx.reserve_alias("t0");
        assert_eq!(ctx.create_subquery_alias().unwrap(), "t1");
        assert!(ctx.is_issued("t1"));
    }

    #[test]
    fn test_suffixed_prefix_does_not_collide() {
        let mut ctx = CompilationContext::new();
        let first = ctx.create_unique_alias("t").unwrap();
        let second = ctx.create_unique_alias("t").unwrap();
        // "t0" as a prefix must not reuse the alias already issued for "t"
        let third = ctx.create_unique_alias("t0").unwrap();
        assert_eq!((first.as_str(), second.as_str()), ("t", "t0"));
        assert_eq!(third, "t00");
    }

    #[test]
    fn test_empty_prefix_is_rejected() {
        let mut ctx = CompilationContext::new();
        assert_eq!(ctx.create_unique_alias(""), Err(IrError::EmptyAliasPrefix));
    }

    #[test]
    fn test_configured_subquery_prefix() {
        let mut ctx = CompilationContext::with_config(IrConfig {
            subquery_alias_prefix: "sq".to_string(),
            ..IrConfig::default()
        });
        assert_eq!(ctx.create_subquery_alias().unwrap(), "sq");
        assert_eq!(ctx.create_subquery_alias().unwrap(), "sq0");
    }
}
