//! Process memory introspection.

/// Resident memory of this process, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    pub current_bytes: u64,
    pub peak_bytes: u64,
}

/// Reads `VmRSS` / `VmHWM` from `/proc/self/status`.
#[cfg(target_os = "linux")]
pub fn probe() -> MemoryUsage {
    let Ok(raw) = std::fs::read_to_string("/proc/self/status") else {
        return MemoryUsage::default();
    };
    parse_status(&raw)
}

/// No portable source off Linux; reports zeros.
#[cfg(not(target_os = "linux"))]
pub fn probe() -> MemoryUsage {
    MemoryUsage::default()
}

pub(crate) fn parse_status(raw: &str) -> MemoryUsage {
    let mut usage = MemoryUsage::default();
    for line in raw.lines() {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let slot = match name {
            "VmRSS" => &mut usage.current_bytes,
            "VmHWM" => &mut usage.peak_bytes,
            _ => continue,
        };
        // "  123456 kB"
        if let Some(kb) = rest.split_whitespace().next().and_then(|v| v.parse::<u64>().ok()) {
            *slot = kb * 1024;
        }
    }
    // HWM can lag RSS between kernel updates.
    usage.peak_bytes = usage.peak_bytes.max(usage.current_bytes);
    usage
}
