//! Prometheus counters for BOM lifecycle events.

use prometheus::{IntCounter, Opts};

#[derive(Clone)]
pub struct BomMetrics {
    pub created: IntCounter,
    pub revised: IntCounter,
    pub stale_revisions: IntCounter,
}

impl BomMetrics {
    /// Creates the counters and registers them with the default registry.
    pub fn register(namespace: &str) -> prometheus::Result<Self> {
        Ok(Self {
            created: counter(namespace, "boms_created_total", "BOMs created")?,
            revised: counter(namespace, "bom_revisions_total", "BOM versions appended by edits")?,
            stale_revisions: counter(
                namespace,
                "bom_stale_revisions_total",
                "Edits rejected because the target was no longer the latest version",
            )?,
        })
    }
}

fn counter(namespace: &str, name: &str, help: &str) -> prometheus::Result<IntCounter> {
    let counter = IntCounter::with_opts(Opts::new(name, help).namespace(namespace))?;

    match prometheus::register(Box::new(counter.clone())) {
        // Only the first instance in a process is exported
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(counter),
        Err(error) => Err(error),
    }
}
