//! This module is the compression capability advisor: a pure query layer
//! that tells codec/I-O callers whether a codec integration is usable in
//! the current environment, and why not when it is disabled.
//!
//! All ambient state (environment variables, bundled library version,
//! device capability) is captured once into an explicit
//! [`FeatureStatusParams`] snapshot. The queries are deterministic
//! functions of that snapshot, so results are referentially transparent
//! and cacheable with the params as the key.

use serde::{Deserialize, Serialize};
use std::fmt;

//==================================================================================
// 1. Codec Set & Status Parameters
//==================================================================================

/// The closed set of codecs the advisor knows about.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    Snappy,
    Zstd,
    Deflate,
    Lz4,
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Version of the compression library the crate was built against.
const LIB_VERSION: (u32, u32, u32) = (2, 6, 1);

/// Environment variable enabling every codec integration, including the
/// experimental ones.
pub const ENV_ALL_INTEGRATIONS: &str = "STRATUM_ALL_CODEC_INTEGRATIONS";
/// Environment variable enabling the stable codec integrations.
pub const ENV_STABLE_INTEGRATIONS: &str = "STRATUM_STABLE_CODEC_INTEGRATIONS";
/// Environment variable overriding the detected device compute capability.
pub const ENV_COMPUTE_CAPABILITY: &str = "STRATUM_COMPUTE_CAPABILITY";

/// The set of parameters that decide whether a codec feature is enabled.
///
/// Equality-comparable and hashable so callers can use it as a cache key.
/// `Default` captures the ambient environment snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureStatusParams {
    pub lib_major: u32,
    pub lib_minor: u32,
    pub lib_patch: u32,
    pub all_integrations_enabled: bool,
    pub stable_integrations_enabled: bool,
    pub compute_capability_major: u32,
}

impl FeatureStatusParams {
    pub fn new(
        lib_major: u32,
        lib_minor: u32,
        lib_patch: u32,
        all_integrations_enabled: bool,
        stable_integrations_enabled: bool,
        compute_capability_major: u32,
    ) -> Self {
        Self {
            lib_major,
            lib_minor,
            lib_patch,
            all_integrations_enabled,
            stable_integrations_enabled,
            compute_capability_major,
        }
    }

    /// Snapshots the ambient environment: bundled library version plus the
    /// integration toggles and capability override from the environment.
    ///
    /// Stable integrations default to enabled; the experimental set must be
    /// opted into explicitly.
    pub fn from_env() -> Self {
        let all = env_flag(ENV_ALL_INTEGRATIONS, false);
        Self {
            lib_major: LIB_VERSION.0,
            lib_minor: LIB_VERSION.1,
            lib_patch: LIB_VERSION.2,
            all_integrations_enabled: all,
            // Enabling everything implies the stable subset.
            stable_integrations_enabled: all || env_flag(ENV_STABLE_INTEGRATIONS, true),
            compute_capability_major: std::env::var(ENV_COMPUTE_CAPABILITY)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
        }
    }

    fn version_at_least(&self, major: u32, minor: u32, patch: u32) -> bool {
        (self.lib_major, self.lib_minor, self.lib_patch) >= (major, minor, patch)
    }
}

impl Default for FeatureStatusParams {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name).as_deref() {
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("on") | Ok("ON") => true,
        Ok("0") | Ok("false") | Ok("FALSE") | Ok("off") | Ok("OFF") => false,
        _ => default,
    }
}

//==================================================================================
// 2. Capability Queries
//==================================================================================

/// Gate shared by both directions: integration toggles and per-codec
/// library version floors.
fn common_disabled_reason(codec: Codec, params: &FeatureStatusParams) -> Option<String> {
    match codec {
        Codec::Deflate => {
            if !params.all_integrations_enabled {
                return Some(format!(
                    "DEFLATE is experimental; set {}=1 to enable it",
                    ENV_ALL_INTEGRATIONS
                ));
            }
            if !params.version_at_least(2, 5, 0) {
                return Some(format!(
                    "DEFLATE requires compression library 2.5.0, found {}.{}.{}",
                    params.lib_major, params.lib_minor, params.lib_patch
                ));
            }
        }
        Codec::Snappy | Codec::Zstd | Codec::Lz4 => {
            if !params.stable_integrations_enabled {
                return Some(format!(
                    "stable codec integrations are disabled; set {}=1 to enable them",
                    ENV_STABLE_INTEGRATIONS
                ));
            }
        }
    }
    if codec == Codec::Lz4 && !params.version_at_least(2, 2, 0) {
        return Some(format!(
            "LZ4 requires compression library 2.2.0, found {}.{}.{}",
            params.lib_major, params.lib_minor, params.lib_patch
        ));
    }
    None
}

/// If compression with `codec` is disabled, returns the reason; `None`
/// means the feature is enabled.
pub fn is_compression_disabled(codec: Codec, params: &FeatureStatusParams) -> Option<String> {
    let verdict = common_disabled_reason(codec, params).or_else(|| {
        if codec == Codec::Zstd {
            if !params.version_at_least(2, 4, 0) {
                return Some(format!(
                    "ZSTD compression requires compression library 2.4.0, found {}.{}.{}",
                    params.lib_major, params.lib_minor, params.lib_patch
                ));
            }
            if params.compute_capability_major < 6 {
                return Some(format!(
                    "ZSTD compression requires compute capability 6.0, found {}.x",
                    params.compute_capability_major
                ));
            }
        }
        None
    });
    if let Some(reason) = &verdict {
        log_metric!("event" = "advisor", "op" = "compress", "codec" = &codec, "disabled" = reason);
    }
    verdict
}

/// If decompression with `codec` is disabled, returns the reason; `None`
/// means the feature is enabled.
pub fn is_decompression_disabled(codec: Codec, params: &FeatureStatusParams) -> Option<String> {
    let verdict = common_disabled_reason(codec, params).or_else(|| {
        if codec == Codec::Zstd && !params.version_at_least(2, 3, 2) {
            return Some(format!(
                "ZSTD decompression requires compression library 2.3.2, found {}.{}.{}",
                params.lib_major, params.lib_minor, params.lib_patch
            ));
        }
        None
    });
    if let Some(reason) = &verdict {
        log_metric!("event" = "advisor", "op" = "decompress", "codec" = &codec, "disabled" = reason);
    }
    verdict
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
