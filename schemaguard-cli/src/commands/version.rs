//! `schemaguard version` command - Display version information.

use crate::error::CliResult;
use crate::output::{self, kv};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const NAME: &str = env!("CARGO_PKG_NAME");

/// Run the version command
pub async fn run() -> CliResult<()> {
    output::header(&format!("SchemaGuard {}", VERSION));

    kv("Version", VERSION);
    kv("Binary", NAME);

    #[cfg(debug_assertions)]
    let build_mode = "debug";
    #[cfg(not(debug_assertions))]
    let build_mode = "release";
    kv("Build", build_mode);

    kv("Features", &features().join(", "));
    kv("Engine", &format!("schemaguard-core {}", schemaguard_core::VERSION));

    Ok(())
}

/// Dialects compiled into this binary.
fn features() -> Vec<&'static str> {
    let mut features = Vec::new();

    #[cfg(feature = "postgres")]
    features.push("postgres");

    #[cfg(feature = "mysql")]
    features.push("mysql");

    if features.is_empty() {
        features.push("none");
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_never_empty() {
        assert!(!features().is_empty());
    }
}
