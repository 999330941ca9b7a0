//! Target-engine capabilities that influence the shape of the IR.
//!
//! The IR itself is dialect-neutral; a dialect only decides which final
//! rewrites run before the tree is handed to a SQL generator.

pub mod row_number_paging;

pub use row_number_paging::RowNumberPagingRewriter;

/// Capabilities of a target SQL engine
pub trait SqlDialect: Send + Sync {
    fn name(&self) -> &str;

    /// Whether `OFFSET n` (or an equivalent) can be emitted directly
    fn supports_offset(&self) -> bool {
        true
    }

    /// Whether `ROW_NUMBER() OVER (...)` is available
    fn supports_window_functions(&self) -> bool {
        true
    }
}

/// Engine with native LIMIT/OFFSET
pub struct StandardDialect;

impl SqlDialect for StandardDialect {
    fn name(&self) -> &str {
        "standard"
    }
}

/// Engine that pages only through `ROW_NUMBER()` windows
pub struct LegacyRowNumberDialect;

impl SqlDialect for LegacyRowNumberDialect {
    fn name(&self) -> &str {
        "legacy_row_number"
    }

    fn supports_offset(&self) -> bool {
        false
    }
}

/// Get the dialect registered under `name`
pub fn get_dialect(name: &str) -> Option<Box<dyn SqlDialect>> {
    match name.to_ascii_lowercase().as_str() {
        "standard" => Some(Box::new(StandardDialect)),
        "legacy_row_number" => Some(Box::new(LegacyRowNumberDialect)),
        _ => None,
    }
}
