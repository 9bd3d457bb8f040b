//! Flatten and shuffle stage
//!
//! Turns per-frame pose lists into one shuffled sequence drawn from the
//! generator's shared stream.

use tracing::debug;

use crate::pose::Pose;
use crate::sampler::Sampler;
use crate::{PoseGenError, Result};

/// Concatenate frame lists in frame order, keeping within-frame order.
pub fn flatten(frames: Vec<Vec<Pose>>) -> Vec<Pose> {
    frames.into_iter().flatten().collect()
}

/// Shuffle `poses` in place and make sure the first one is unflipped.
pub fn shuffle_poses(sampler: &mut Sampler, poses: &mut [Pose]) -> Result<()> {
    if poses.is_empty() {
        return Ok(());
    }
    sampler.shuffle(poses);
    ensure_unflipped_lead(sampler, poses)
}

/// Reshuffle until the first pose is unflipped.
///
/// The augmenter cannot start a sequence on a flipped pose. Drop this once it
/// can.
pub fn ensure_unflipped_lead(sampler: &mut Sampler, poses: &mut [Pose]) -> Result<()> {
    if poses.is_empty() || !poses[0].flip {
        return Ok(());
    }
    if poses.iter().all(|pose| pose.flip) {
        return Err(PoseGenError::InternalInconsistency(format!(
            "all {} poses are flipped, no valid first pose exists",
            poses.len()
        )));
    }

    let mut reshuffles = 0usize;
    while poses[0].flip {
        sampler.shuffle(poses);
        reshuffles += 1;
    }
    debug!(reshuffles, "reshuffled to move an unflipped pose first");
    Ok(())
}
