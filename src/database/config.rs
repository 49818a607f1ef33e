use std::sync::Arc;

use crate::error::WebSqlError;
use crate::store::StorageEngine;
use crate::types::CollectionMode;

use super::DatabaseHandle;

/// Options for opening a legacy database handle.
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub name: String,
    /// Legacy version string; coerced with [`parse_version`].
    pub version: String,
    pub display_name: String,
    /// Accepted for signature compatibility and ignored.
    pub estimated_size: u64,
    pub collection_mode: CollectionMode,
    /// Collections created during the first upgrade in per-statement mode.
    pub collections: Vec<String>,
}

impl DatabaseOptions {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            display_name: String::new(),
            estimated_size: 0,
            collection_mode: CollectionMode::default(),
            collections: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_collection_mode(mut self, mode: CollectionMode) -> Self {
        self.collection_mode = mode;
        self
    }
}

/// Fluent builder for [`DatabaseOptions`].
#[derive(Debug, Clone)]
pub struct DatabaseOptionsBuilder {
    opts: DatabaseOptions,
}

impl DatabaseOptionsBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            opts: DatabaseOptions::new(name),
        }
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.opts.version = version.into();
        self
    }

    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.opts.display_name = display_name.into();
        self
    }

    #[must_use]
    pub fn estimated_size(mut self, estimated_size: u64) -> Self {
        self.opts.estimated_size = estimated_size;
        self
    }

    #[must_use]
    pub fn collection_mode(mut self, mode: CollectionMode) -> Self {
        self.opts.collection_mode = mode;
        self
    }

    #[must_use]
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.opts.collections.push(name.into());
        self
    }

    #[must_use]
    pub fn finish(self) -> DatabaseOptions {
        self.opts
    }

    /// Open a handle on `engine`. Initialization continues in the background; see
    /// [`DatabaseHandle::ready`].
    #[must_use]
    pub fn open(self, engine: Arc<dyn StorageEngine>) -> DatabaseHandle {
        DatabaseHandle::open(engine, self.finish())
    }
}

/// Coerce a legacy version string into an engine version.
///
/// Leading whitespace and an optional sign are skipped and the leading run of digits is used,
/// so `"2.5"` opens version 2. A blank string means "whatever version is stored".
///
/// # Errors
/// Returns `WebSqlError::ConfigError` when no digits lead the string or the number is not a
/// positive 32-bit version.
pub fn parse_version(version: &str) -> Result<Option<u32>, WebSqlError> {
    let trimmed = version.trim_start();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (negative, unsigned) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = unsigned
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return Err(WebSqlError::ConfigError(format!(
            "version {version:?} is not a number"
        )));
    }

    let digits = &unsigned[..digits_len];
    match digits.parse::<u32>() {
        Ok(0) => Err(WebSqlError::ConfigError(format!(
            "version {version:?} must be positive"
        ))),
        Ok(_) if negative => Err(WebSqlError::ConfigError(format!(
            "version {version:?} must be positive"
        ))),
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(WebSqlError::ConfigError(format!(
            "version {version:?} is out of range"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_prefix_is_used() {
        assert_eq!(parse_version("1").unwrap(), Some(1));
        assert_eq!(parse_version("2.5").unwrap(), Some(2));
        assert_eq!(parse_version("  7 beta").unwrap(), Some(7));
        assert_eq!(parse_version("+3").unwrap(), Some(3));
    }

    #[test]
    fn blank_version_opens_any() {
        assert_eq!(parse_version("").unwrap(), None);
        assert_eq!(parse_version("   ").unwrap(), None);
    }

    #[test]
    fn rejects_non_numeric_and_non_positive() {
        for bad in ["abc", "v1", "0", "-2", "99999999999", "."] {
            assert!(
                matches!(parse_version(bad), Err(WebSqlError::ConfigError(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn builder_collects_options() {
        let opts = DatabaseOptionsBuilder::new("notes")
            .version("2")
            .display_name("Notes")
            .estimated_size(1024)
            .collection_mode(CollectionMode::Fixed)
            .collection("todo")
            .finish();
        assert_eq!(opts.name, "notes");
        assert_eq!(opts.version, "2");
        assert_eq!(opts.display_name, "Notes");
        assert_eq!(opts.estimated_size, 1024);
        assert_eq!(opts.collection_mode, CollectionMode::Fixed);
        assert_eq!(opts.collections, vec!["todo".to_string()]);
    }
}
