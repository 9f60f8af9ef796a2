//! User-Agent string for storage API requests.

/// Default User-Agent for storage requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("pdf-harvester/{version} (folder-harvester)")
}
