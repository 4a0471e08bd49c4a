// src/exec/limits.rs

//! Process-wide resource limits.
//!
//! The atmosphere and synthesis tools recurse deeply and keep large arrays on
//! the stack, so the stack rlimit is lifted before they run. This mutates the
//! limit of the whole worker process (inherited by every child), not of a
//! single job.

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::resource::{getrlimit, setrlimit, Resource, RLIM_INFINITY};
use tracing::{debug, warn};

/// Set the stack limit to unlimited.
///
/// Unprivileged processes may not raise their hard limit; in that case the
/// soft limit is raised to the hard limit instead.
pub fn raise_stack_limit() -> Result<()> {
    match setrlimit(Resource::RLIMIT_STACK, RLIM_INFINITY, RLIM_INFINITY) {
        Ok(()) => {
            debug!("stack limit set to unlimited");
            Ok(())
        }
        Err(Errno::EPERM) => {
            let (_, hard) = getrlimit(Resource::RLIMIT_STACK).context("reading stack limit")?;
            setrlimit(Resource::RLIMIT_STACK, hard, hard).context("raising soft stack limit")?;
            warn!(
                hard_limit = hard,
                "cannot lift hard stack limit; soft limit raised to hard limit"
            );
            Ok(())
        }
        Err(err) => Err(err).context("setting stack limit"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raising_leaves_soft_equal_to_hard() {
        raise_stack_limit().unwrap();
        let (soft, hard) = getrlimit(Resource::RLIMIT_STACK).unwrap();
        assert_eq!(soft, hard);
    }
}
