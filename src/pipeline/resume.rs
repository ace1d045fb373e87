/// Index at which a restarted stage should continue.
///
/// Scans backward from `count - 1` for the newest index whose output `exists` and returns the
/// one after it, or 0 when nothing was produced yet.
pub fn resume_point(count: u64, exists: impl Fn(u64) -> bool) -> u64 {
    (0..count)
        .rev()
        .find(|&i| exists(i))
        .map_or(0, |i| i + 1)
}
