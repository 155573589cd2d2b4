//! Reading and writing schema files.
//!
//! A schema file is a JSON array of tables in the PascalCase vocabulary of
//! [`crate::model`].

use std::path::Path;

use tracing::debug;

use crate::error::CoreResult;
use crate::model::Schema;

/// Parse a schema from JSON text. Null `Columns`/`ForeignKeys` read as empty.
pub fn parse(json: &str) -> CoreResult<Schema> {
    Ok(serde_json::from_str(json)?)
}

/// Load a schema file.
pub async fn load(path: impl AsRef<Path>) -> CoreResult<Schema> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await?;
    let schema = parse(&content)?;
    debug!(path = %path.display(), tables = schema.len(), "Loaded schema file");
    Ok(schema)
}

/// Pretty-printed JSON for `schema`.
pub fn to_json(schema: &Schema) -> CoreResult<String> {
    Ok(serde_json::to_string_pretty(schema)?)
}

/// Write `schema` to `path`, creating parent directories as needed.
pub async fn save(path: impl AsRef<Path>, schema: &Schema) -> CoreResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, to_json(schema)?).await?;
    debug!(path = %path.display(), tables = schema.len(), "Saved schema file");
    Ok(())
}
