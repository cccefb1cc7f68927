use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use depfence_core::policy::Policy;

/// Open and load a policy file.
pub fn load_policy<P: AsRef<Path>>(path: P) -> Result<Policy> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("Unable to open policy file {}", path.display()))?;
    let policy = Policy::from_reader(BufReader::new(f))
        .with_context(|| format!("Unable to load policy {}", path.display()))?;
    debug!(
        "loaded policy {} ({} components, {} constraints)",
        path.display(),
        policy.component_names().count(),
        policy.constraints().len()
    );
    Ok(policy)
}
