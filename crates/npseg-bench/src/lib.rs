// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Benchmark-only workspace member.
pub fn crate_name() -> &'static str {
    "npseg-bench"
}
