//! Display formatting helpers.

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Format hashes per second as megahashes, e.g. `"12.345 MH/s"`.
pub fn format_hash_rate(hashes_per_sec: f64) -> String {
    format!("{:.3} MH/s", hashes_per_sec / 1_000_000.0)
}
