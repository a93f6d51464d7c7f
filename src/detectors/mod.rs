use std::time::Duration;

use async_trait::async_trait;

use crate::core::target::Target;
use crate::core::verdict::DetectorResult;

pub mod content;
pub mod domain_age;
pub mod heuristic;
pub mod reputation;
pub mod tls;
pub mod typosquat;

pub const HEURISTIC: &str = "heuristic";
pub const TYPOSQUAT: &str = "typosquat";
pub const TLS: &str = "tls";
pub const DOMAIN_AGE: &str = "domain_age";
pub const CONTENT: &str = "content";
pub const REPUTATION: &str = "reputation";

/// Uniform capability every signal probe implements. `detect` is infallible
/// by contract: internal faults become `DetectorResult { success: false }`
/// with a diagnostic flag, never an error to the orchestrator.
#[async_trait]
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;
    fn timeout(&self) -> Duration;
    async fn detect(&self, target: &Target) -> DetectorResult;
}
