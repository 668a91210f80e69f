//! Per-frame queries against a decoded model.
//!
//! Animation state (current sequence, controller values, packed body value)
//! belongs to the caller; these functions only compute from it. Indices that
//! are out of range give a neutral result instead of an error because old
//! content routinely refers to channels that don't exist. Nothing here logs.

use crate::studio::types::{MotionTypes, SequenceFlags, StudioFile};

/// Frame rate and root motion speed of a sequence.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SequenceInfo {
    /// In 1/256ths of a frame per second.
    pub frame_rate: f32,
    pub ground_speed: f32,
}

/// A controller or blend value mapped into its control byte.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Normalized {
    pub value: u8,
    /// The input after inversion and wraparound. Callers should store this
    /// back so their state stays continuous across wraps.
    pub corrected: f32,
}

pub fn sequence_flags(file: &StudioFile, sequence: usize) -> SequenceFlags {
    match file.sequences.get(sequence) {
        Some(seq) => seq.flags,
        None => SequenceFlags::empty(),
    }
}

pub fn sequence_info(file: &StudioFile, sequence: usize) -> SequenceInfo {
    let seq = match file.sequences.get(sequence) {
        Some(seq) => seq,
        None => return SequenceInfo { frame_rate: 0.0, ground_speed: 0.0 },
    };

    if seq.frame_count > 1 {
        let last_frame = (seq.frame_count - 1) as f32;
        SequenceInfo {
            frame_rate: 256.0 * seq.fps / last_frame,
            ground_speed: seq.ground_distance() * seq.fps / last_frame,
        }
    } else {
        SequenceInfo { frame_rate: 256.0, ground_speed: 0.0 }
    }
}

/// Which sub-model of body part `group` the packed value selects.
pub fn body_group_value(file: &StudioFile, packed: u32, group: usize) -> u32 {
    let part = match file.body_parts.get(group) {
        Some(part) => part,
        None => return 0,
    };

    let num_models = part.models.len() as u32;
    if num_models <= 1 {
        return 0;
    }

    (packed / part.base) % num_models
}

/// Returns `packed` with body part `group` switched to sub-model `value`.
/// The other parts' selections are untouched. Invalid requests return
/// `packed` unchanged.
pub fn set_body_group_value(file: &StudioFile, packed: u32, group: usize, value: u32) -> u32 {
    let part = match file.body_parts.get(group) {
        Some(part) => part,
        None => return packed,
    };

    let num_models = part.models.len() as u32;
    if value >= num_models {
        return packed;
    }

    let current = (packed / part.base) % num_models;

    packed
        .wrapping_sub(current.wrapping_mul(part.base))
        .wrapping_add(value.wrapping_mul(part.base))
}

/// Maps `value` into the byte for the first controller whose logical index
/// is `controller`. `None` if there's no such controller.
pub fn controller_value(file: &StudioFile, controller: i32, value: f32) -> Option<Normalized> {
    // Several records can share a logical index (one per axis); the first
    // one decides.
    let ctl = file.bone_controllers.iter().find(|c| c.index == controller)?;

    let mut corrected = value;

    if ctl.motion_type.is_rotation() {
        corrected = recenter_rotation(corrected, ctl.start, ctl.end);

        if !is_narrow_range(ctl.start, ctl.end) {
            // Full-circle controller, bring it into [0, 360]
            if corrected > 360.0 {
                corrected -= (corrected / 360.0) as i32 as f32 * 360.0;
            } else if corrected < 0.0 {
                corrected += ((corrected / -360.0) + 1.0) as i32 as f32 * 360.0;
            }
        }
    }

    Some(Normalized {
        value: to_byte(corrected, ctl.start, ctl.end),
        corrected,
    })
}

/// Maps `value` into the byte for blend channel `blender` of a sequence.
/// `None` if either index is out of range or the channel is inactive.
///
/// Unlike `controller_value` this never reduces full-circle ranges into
/// [0, 360]; blend ranges are expected to be narrower than that.
pub fn blending_value(file: &StudioFile, sequence: usize, blender: usize, value: f32) -> Option<Normalized> {
    let blend = file.sequences.get(sequence)?.blends.get(blender)?;

    if blend.motion_type == MotionTypes::empty() {
        return None;
    }

    let mut corrected = value;

    if blend.motion_type.is_rotation() {
        corrected = recenter_rotation(corrected, blend.start, blend.end);
    }

    Some(Normalized {
        value: to_byte(corrected, blend.start, blend.end),
        corrected,
    })
}

/// Whether a rotational range is less than a full turn.
fn is_narrow_range(start: f32, end: f32) -> bool {
    start as f64 + 359.0 >= end as f64
}

/// Applies axis inversion and, for narrow ranges, moves the value into the
/// half-open window `[mid - 180, mid + 180)` around the range midpoint.
fn recenter_rotation(value: f32, start: f32, end: f32) -> f32 {
    let mut value = value;

    // A reversed range means the axis is inverted.
    if end < start {
        value = -value;
    }

    if is_narrow_range(start, end) {
        let mid = (start as f64 + end as f64) / 2.0;
        if value as f64 >= mid + 180.0 {
            value -= 360.0;
        }
        if (value as f64) < mid - 180.0 {
            value += 360.0;
        }
    }

    value
}

/// Linear map of `[start, end]` onto `[0, 255]`, truncated then clamped.
fn to_byte(value: f32, start: f32, end: f32) -> u8 {
    let setting = (255.0 * (value - start) / (end - start)) as i32;
    setting.max(0).min(255) as u8
}
