//! Status sweep over a list of ports.

use super::classifier::PortStatus;
use super::engine::Diagnostics;
use crate::port::PortInfo;
use tracing::info;

/// Classify every port in `ports`, in order.
///
/// Each port is opened and released before the next one is tried, and a
/// failure on one port has no effect on the others. Callers are expected to
/// have handled the empty list already; it yields an empty result.
pub fn run_all_diagnostics<D>(diagnostics: &D, ports: &[PortInfo]) -> Vec<(PortInfo, PortStatus)>
where
    D: Diagnostics + ?Sized,
{
    info!(count = ports.len(), "running status check on all ports");

    let results: Vec<_> = ports
        .iter()
        .map(|port| (port.clone(), diagnostics.classify_status(port)))
        .collect();

    let ready = results.iter().filter(|(_, s)| s.category.is_ready()).count();
    info!(ready, total = results.len(), "status check complete");
    results
}
