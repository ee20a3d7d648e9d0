//! Memory size detection and swap sizing.

use std::path::Path;

use tracing::warn;

use crate::probe::Probe;

/// RAM size assumed when detection fails.
pub const DEFAULT_RAM_GB: u64 = 8;

const MEMINFO: &str = "/proc/meminfo";
const KB_PER_GB: u64 = 1024 * 1024;

/// Total memory in whole gigabytes, rounded to nearest, from `/proc/meminfo`
/// text. `None` if the `MemTotal` line is missing or malformed.
pub fn parse_meminfo_gb(meminfo: &str) -> Option<u64> {
    let line = meminfo
        .lines()
        .find(|line| line.trim_start().starts_with("MemTotal:"))?;
    let total_kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some((total_kb + KB_PER_GB / 2) / KB_PER_GB)
}

/// Detected RAM in gigabytes, [`DEFAULT_RAM_GB`] if it cannot be read.
pub fn detect_ram_gb(probe: &dyn Probe) -> u64 {
    let meminfo = match probe.read_to_string(Path::new(MEMINFO)) {
        Ok(meminfo) => meminfo,
        Err(err) => {
            warn!("Failed to read {MEMINFO}, assuming {DEFAULT_RAM_GB} GB - {err}");
            return DEFAULT_RAM_GB;
        }
    };
    parse_meminfo_gb(&meminfo).unwrap_or_else(|| {
        warn!("Unexpected {MEMINFO} format, assuming {DEFAULT_RAM_GB} GB");
        DEFAULT_RAM_GB
    })
}

/// Suggested swap size in gigabytes for `ram_gb` of memory.
///
/// Up to 2 GB: twice the RAM. Up to 8 GB: same as RAM. Up to 64 GB: half the
/// RAM but at least 4 GB. Above: 4 GB.
pub fn suggested_swap_gb(ram_gb: u64) -> u64 {
    match ram_gb {
        0..=2 => ram_gb * 2,
        3..=8 => ram_gb,
        9..=64 => (ram_gb / 2).max(4),
        _ => 4,
    }
}
