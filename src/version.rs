// Build-time version from Cargo.toml

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Numeric components of `1.2.3` / `v1.2.3`; None when any component is not a number.
fn numeric_version(tag: &str) -> Option<Vec<u64>> {
    let tag = tag.strip_prefix('v').unwrap_or(tag);
    if tag.is_empty() {
        return None;
    }
    tag.split('.').map(|p| p.parse().ok()).collect()
}

/// Highest version tag in `git ls-remote --tags` output, without the `v` prefix.
/// Tags that are not plain dotted numbers are ignored.
pub fn latest_tag_version(ls_remote: &str) -> Option<String> {
    ls_remote
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .filter_map(|r| r.strip_prefix("refs/tags/"))
        .map(|t| t.trim_end_matches("^{}"))
        .filter_map(|t| numeric_version(t).map(|n| (n, t)))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, t)| t.strip_prefix('v').unwrap_or(t).to_string())
}
