//! Resource identifiers.
//!
//! A resource is addressed as `mysql://<host>:<port>/<database>/<table>/<kind>`.
//! Only the last two path segments carry meaning when a URI is read back; the
//! authority and database prefix come from the server's own configuration.

use crate::error::{DbError, DbResult};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// What a resource describes about its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// The table's column list.
    Schema,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "schema" => Ok(Self::Schema),
            other => Err(format!("unsupported resource kind '{}'", other)),
        }
    }
}

/// A parsed resource URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub table: String,
    pub kind: ResourceKind,
}

impl ResourceId {
    /// The schema resource of `table`.
    pub fn schema(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            kind: ResourceKind::Schema,
        }
    }

    /// Build the URI under `base`, which must end in `/<database>/`.
    ///
    /// The table name is percent-encoded as a single path segment. The URI is
    /// assembled as text because `Url` folds `.` and `..` segments, even
    /// percent-encoded ones.
    pub fn to_uri(&self, base: &Url) -> DbResult<String> {
        if base.cannot_be_a_base() || !base.path().ends_with('/') {
            return Err(DbError::internal(format!(
                "Base URI '{}' must end in '/<database>/'",
                base
            )));
        }
        Ok(format!(
            "{}{}/{}",
            base.as_str(),
            encode_segment(&self.table),
            self.kind
        ))
    }

    /// Parse a resource URI.
    ///
    /// The last path segment is the kind and the one before it the table name.
    pub fn parse(uri: &str) -> DbResult<Self> {
        let invalid = |reason: String| DbError::invalid_resource(uri, reason);

        Url::parse(uri).map_err(|e| invalid(format!("not a valid URI ({})", e)))?;
        // Segments come from the raw text; the parsed path has dot segments folded
        let path = raw_path(uri).ok_or_else(|| invalid("URI has no path".to_string()))?;
        let segments: Vec<&str> = path.split('/').collect();

        let (kind, table) = match segments.as_slice() {
            [.., table, kind] => (*kind, *table),
            [kind] => (*kind, ""),
            [] => ("", ""),
        };

        let kind: ResourceKind = kind.parse().map_err(invalid)?;
        if table.is_empty() {
            return Err(invalid("missing table name".to_string()));
        }
        if table == "." || table == ".." {
            return Err(invalid("dot segment in place of a table name".to_string()));
        }
        let table = urlencoding::decode(table)
            .map_err(|_| invalid("table name is not valid UTF-8".to_string()))?
            .into_owned();

        Ok(Self { table, kind })
    }
}

/// Percent-encode a table name as one path segment.
///
/// `.` and `..` are not encoded by the usual rules but would be read as dot
/// segments, so their dots are escaped too.
fn encode_segment(table: &str) -> String {
    match table {
        "." | ".." => table.replace('.', "%2E"),
        _ => urlencoding::encode(table).into_owned(),
    }
}

/// The path of `scheme://authority/path?query#fragment`, without its leading `/`.
fn raw_path(uri: &str) -> Option<&str> {
    let after_scheme = &uri[uri.find("://")? + 3..];
    let path = &after_scheme[after_scheme.find('/')? + 1..];
    let end = path.find(['?', '#']).unwrap_or(path.len());
    Some(&path[..end])
}
