// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tracing subscriber bootstrap for binaries and test harnesses that embed the
// engine.

use tracing_subscriber::EnvFilter;

/// Install a formatted `tracing` subscriber.
///
/// The filter is read from `RUST_LOG`; when unset or unparsable,
/// `default_directive` is used (e.g. `"info"` or `"qrmagic_engine=debug"`).
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(default_directive: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let _ = init_tracing("warn");
        assert!(!init_tracing("warn"));
    }
}
