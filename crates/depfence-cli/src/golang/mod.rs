//! Package enumeration and dependency resolution backed by `go list`.

use std::process::Command;

use thiserror::Error;
use tracing::debug;

mod list;
mod resolve;

pub use list::GoListEnumerator;
pub use resolve::GoListResolver;

#[derive(Debug, Error)]
pub enum GoError {
    #[error("unable to run go")]
    Spawn(#[source] std::io::Error),

    #[error("go list {args} failed: {stderr}")]
    Failed { args: String, stderr: String },

    #[error("invalid go list output")]
    Parse(#[from] serde_json::Error),

    #[error("package {0} not found")]
    Missing(String),

    #[error("{pkg}: {message}")]
    Package { pkg: String, message: String },
}

/// Run `go list <args>` in the current directory and return its stdout.
fn go_list(args: &[&str]) -> Result<Vec<u8>, GoError> {
    debug!("running go list {}", args.join(" "));
    let out = Command::new("go")
        .arg("list")
        .args(args)
        .output()
        .map_err(GoError::Spawn)?;

    if !out.status.success() {
        return Err(failure(args, &out.stderr));
    }
    Ok(out.stdout)
}

fn failure(args: &[&str], stderr: &[u8]) -> GoError {
    GoError::Failed {
        args: args.join(" "),
        stderr: String::from_utf8_lossy(stderr).trim().to_string(),
    }
}
