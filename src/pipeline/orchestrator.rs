use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::core::target::Target;
use crate::core::verdict::{DetectorResult, SignalSet};
use crate::detectors::{Detector, DOMAIN_AGE};

/// Fan out one target to every registered detector concurrently, each bound
/// by its own deadline. Every detector gets exactly one slot in the returned
/// set: a real result, a timeout placeholder, a failure placeholder, or a
/// skip placeholder. One detector misbehaving never aborts its siblings.
pub async fn run_detectors(detectors: &[Arc<dyn Detector>], target: &Arc<Target>) -> SignalSet {
    let mut slots: Vec<(&'static str, Option<JoinHandle<DetectorResult>>)> =
        Vec::with_capacity(detectors.len());

    for detector in detectors {
        let name = detector.name();
        // shared platforms have no meaningful per-tenant registration date
        if name == DOMAIN_AGE && target.is_hosted_platform {
            slots.push((name, None));
            continue;
        }
        let detector = Arc::clone(detector);
        let target = Arc::clone(target);
        let deadline = detector.timeout();
        slots.push((
            name,
            Some(tokio::spawn(async move {
                match tokio::time::timeout(deadline, detector.detect(&target)).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(
                            "detector {} exceeded its {:?} deadline",
                            detector.name(),
                            deadline
                        );
                        DetectorResult::failure(0, &timeout_flag(detector.name()))
                    }
                }
            })),
        ));
    }

    let mut signals = SignalSet::new();
    for (name, handle) in slots {
        let result = match handle {
            None => DetectorResult::scored(0, vec!["SKIPPED".to_string()]),
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(err) => {
                    tracing::warn!("detector {} aborted: {}", name, err);
                    DetectorResult::failure(0, "DETECTOR_FAILED")
                }
            },
        };
        signals.insert(name, result);
    }
    signals
}

fn timeout_flag(name: &str) -> String {
    format!("{}_TIMEOUT", name.to_uppercase())
}
