// Linux-specific helpers: /etc/os-release, /proc/meminfo.

/// Distro display name from /etc/os-release (PRETTY_NAME, then NAME).
pub(super) fn read_os_distro_linux() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/etc/os-release").ok()?;
        return parse_os_release(&content);
    }
    #[cfg(not(target_os = "linux"))]
    None
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_os_release(content: &str) -> Option<String> {
    for key in ["PRETTY_NAME=", "NAME="] {
        if let Some(v) = content
            .lines()
            .find_map(|line| line.strip_prefix(key))
            .map(|v| v.trim().trim_matches('"'))
            .filter(|v| !v.is_empty())
        {
            return Some(v.to_string());
        }
    }
    None
}

/// Page cache size in bytes ("Cached:" in /proc/meminfo). sysinfo does not expose it.
pub(super) fn read_cached_memory_linux() -> u64 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(content) = std::fs::read_to_string("/proc/meminfo") {
            return parse_meminfo_cached(&content).unwrap_or(0);
        }
    }
    0
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_meminfo_cached(content: &str) -> Option<u64> {
    let line = content.lines().find(|l| l.starts_with("Cached:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kib * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_release_prefers_pretty_name() {
        let content = "NAME=\"Debian GNU/Linux\"\nPRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"\n";
        assert_eq!(
            parse_os_release(content).as_deref(),
            Some("Debian GNU/Linux 12 (bookworm)")
        );
    }

    #[test]
    fn os_release_falls_back_to_name() {
        assert_eq!(parse_os_release("NAME=Alpine\n").as_deref(), Some("Alpine"));
        assert_eq!(parse_os_release("ID=x\n"), None);
    }

    #[test]
    fn meminfo_cached_is_converted_to_bytes() {
        let content = "MemTotal:       16303428 kB\nCached:          2048 kB\nSwapCached: 0 kB\n";
        assert_eq!(parse_meminfo_cached(content), Some(2048 * 1024));
    }
}
