// ─── Version Comparison ───
// Numeric, component-wise comparison of Minecraft and loader versions.

use std::cmp::Ordering;

fn parse_numeric_version_parts(raw: &str) -> Vec<u32> {
    raw.split(|c: char| !c.is_ascii_digit())
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| segment.parse::<u32>().ok())
        .collect()
}

/// Compares two versions component by component. Missing components count
/// as zero, so `1.20` equals `1.20.0`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = parse_numeric_version_parts(a);
    let b_parts = parse_numeric_version_parts(b);

    let max_len = a_parts.len().max(b_parts.len());
    for idx in 0..max_len {
        let a_val = a_parts.get(idx).copied().unwrap_or(0);
        let b_val = b_parts.get(idx).copied().unwrap_or(0);
        match a_val.cmp(&b_val) {
            Ordering::Equal => continue,
            non_eq => return non_eq,
        }
    }

    Ordering::Equal
}

/// `true` when `actual` is the same as or newer than `desired`.
pub fn mc_version_at_least(desired: &str, actual: &str) -> bool {
    compare_versions(actual, desired) != Ordering::Less
}

/// Minor component of the Minecraft version that prefixes a manifest id,
/// e.g. `7` for `1.7.10-Forge10.13.4.1614-1.7.10`.
pub fn manifest_minor_version(manifest_id: &str) -> Option<u32> {
    manifest_id
        .split('-')
        .next()?
        .split('.')
        .nth(1)?
        .parse()
        .ok()
}

/// Loader build segment of a manifest id, e.g. `14.23.5.2854` for
/// `1.12.2-forge-14.23.5.2854`.
pub fn loader_build_segment(manifest_id: &str) -> Option<&str> {
    manifest_id.split('-').nth(2)
}

/// Parses a dotted build number into exactly `N` numeric components.
pub fn parse_build_number<const N: usize>(raw: &str) -> Option<[u32; N]> {
    let parts: Vec<&str> = raw.split('.').collect();
    if parts.len() != N {
        return None;
    }

    let mut out = [0u32; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.trim().parse().ok()?;
    }
    Some(out)
}
