//! Execution-method selection.
//!
//! A [`MethodPolicy`] maps every (media kind, complexity) pair to a
//! processing method. The default table sends video to the sandbox and
//! everything else to the local analyzer.

use crate::types::{Complexity, MediaDescriptor, MediaKind, ProcessingMethod};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Processing method per complexity tier for one media kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierMethods {
    pub simple: ProcessingMethod,
    pub medium: ProcessingMethod,
    pub complex: ProcessingMethod,
    pub enterprise: ProcessingMethod,
}

impl TierMethods {
    pub const fn uniform(method: ProcessingMethod) -> Self {
        Self {
            simple: method,
            medium: method,
            complex: method,
            enterprise: method,
        }
    }

    pub fn get(&self, complexity: Complexity) -> ProcessingMethod {
        match complexity {
            Complexity::Simple => self.simple,
            Complexity::Medium => self.medium,
            Complexity::Complex => self.complex,
            Complexity::Enterprise => self.enterprise,
        }
    }
}

impl Default for TierMethods {
    fn default() -> Self {
        Self::uniform(ProcessingMethod::Local)
    }
}

/// The (media kind, complexity) -> method table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodPolicy {
    pub image: TierMethods,
    pub video: TierMethods,
    pub audio: TierMethods,
    pub other: TierMethods,
}

impl Default for MethodPolicy {
    fn default() -> Self {
        Self {
            image: TierMethods::uniform(ProcessingMethod::Local),
            video: TierMethods::uniform(ProcessingMethod::Sandbox),
            audio: TierMethods::uniform(ProcessingMethod::Local),
            other: TierMethods::uniform(ProcessingMethod::Local),
        }
    }
}

impl MethodPolicy {
    pub fn method_for(&self, kind: MediaKind, complexity: Complexity) -> ProcessingMethod {
        let row = match kind {
            MediaKind::Image => &self.image,
            MediaKind::Video => &self.video,
            MediaKind::Audio => &self.audio,
            MediaKind::Other => &self.other,
        };
        row.get(complexity)
    }

    /// Pick the processing method for a classified file.
    pub fn select_method(
        &self,
        descriptor: &MediaDescriptor,
        complexity: Complexity,
    ) -> ProcessingMethod {
        self.method_for(descriptor.kind(), complexity)
    }
}

/// Whether the sandbox execution timeout is disabled for this file.
///
/// Disabled for every video and for complex/enterprise files of any kind.
pub fn timeout_disabled(kind: MediaKind, complexity: Complexity) -> bool {
    kind == MediaKind::Video || matches!(complexity, Complexity::Complex | Complexity::Enterprise)
}

/// Execution timeout for the sandbox script, `None` when disabled.
pub fn execution_timeout(kind: MediaKind, complexity: Complexity) -> Option<Duration> {
    if timeout_disabled(kind, complexity) {
        return None;
    }
    let minutes = match complexity {
        Complexity::Simple => 5,
        Complexity::Medium => 15,
        Complexity::Complex => 45,
        Complexity::Enterprise => 120,
    };
    Some(Duration::from_secs(minutes * 60))
}
