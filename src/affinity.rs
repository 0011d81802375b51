//! Worker-affinity contract
//!
//! Pinned backends assert the CPU a task intends to run on before every
//! piece of work, because schedulers may rotate worker threads between
//! activations. Pinning is a locality hint, never a correctness gate:
//! failure is logged once per call site and the computation proceeds.

use std::sync::OnceLock;

use core_affinity::CoreId;

fn core_ids() -> &'static [CoreId] {
    static IDS: OnceLock<Vec<CoreId>> = OnceLock::new();
    IDS.get_or_init(|| core_affinity::get_core_ids().unwrap_or_default())
}

/// Binds the calling thread to the CPU identified by `cpu`.
///
/// `cpu` is taken modulo the number of enumerable cores, so callers can pass
/// `partition_index % worker_count` directly. Returns whether the mask was
/// applied.
pub fn pin_current(cpu: usize) -> bool {
    let ids = core_ids();
    if ids.is_empty() {
        log::warn!("cannot pin thread to cpu {cpu}: no enumerable cores");
        return false;
    }

    let id = ids[cpu % ids.len()];
    let ok = core_affinity::set_for_current(id);
    if !ok {
        log::warn!("failed to pin thread to cpu {}", id.id);
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_does_not_panic_for_large_ids() {
        // Result depends on the host; only the modulo mapping is under test.
        let _ = pin_current(0);
        let _ = pin_current(10_000);
    }
}
