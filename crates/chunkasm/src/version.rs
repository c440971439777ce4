//! Version information.

/// Get the version string.
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get the full version string with the target platform.
#[must_use]
pub fn full_version() -> String {
    format!(
        "chunkasm {} ({} {})",
        version(),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
