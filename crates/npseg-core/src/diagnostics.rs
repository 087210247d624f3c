// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::borrow::Cow;

/// Structured diagnostics captured from a detector run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    pub n: usize,
    pub p: usize,
    pub runtime_ms: Option<u64>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub algorithm: Cow<'static, str>,
    pub engine_version: Option<String>,
    pub seed: Option<u64>,
    pub thread_count: Option<usize>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            n: 0,
            p: 0,
            runtime_ms: None,
            notes: vec![],
            warnings: vec![],
            algorithm: Cow::Borrowed(""),
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            seed: None,
            thread_count: None,
        }
    }
}
