//! Compressed animation channels.
//!
//! For each blend a sequence has one record per bone, each holding six `u16`
//! offsets (one per DOF) relative to the record itself. An offset of 0 means
//! the DOF isn't animated. Otherwise it points at a run-length encoded stream
//! of `i16`s:
//!
//! ```text
//!   [valid: u8, total: u8] [value; valid] [valid: u8, total: u8] ...
//! ```
//!
//! A run covers `total` frames. The first `valid` frames take their values in
//! order; the rest of the run repeats the last one.
//!
//! A run takes at least four bytes and covers at most 255 frames, so honest
//! data can't expand to more than about 64 values per byte. Channels may
//! point at the same stream though, so decoding is metered against a
//! `DecodeBudget` sized from the file.

use smallvec::SmallVec;
use crate::errors::Result;
use crate::studio::types::{BoneAnimation, NUM_CHANNELS};
use crate::util::cur::Cur;

const ANIM_RECORD_SIZE: usize = 2 * NUM_CHANNELS;
const MAX_VALUES_PER_BYTE: usize = 64;

/// How many more animation values a file may decode to.
pub struct DecodeBudget {
    remaining: usize,
}

impl DecodeBudget {
    pub fn for_file_len(len: usize) -> DecodeBudget {
        DecodeBudget { remaining: len.saturating_mul(MAX_VALUES_PER_BYTE) }
    }

    fn take(&mut self, n: usize, pos: usize) -> Result<()> {
        if n > self.remaining {
            bail!("animation channel at {:#x} decodes to more data than the file can hold", pos);
        }
        self.remaining -= n;
        Ok(())
    }
}

pub fn read_animations(
    cur: Cur,
    num_blends: usize,
    num_bones: usize,
    num_frames: usize,
    budget: &mut DecodeBudget,
) -> Result<SmallVec<[Vec<BoneAnimation>; 4]>> {
    let mut blends = SmallVec::new();
    if num_bones == 0 {
        return Ok(blends);
    }

    for blend in 0..num_blends {
        let blend_cur = cur + blend * num_bones * ANIM_RECORD_SIZE;
        // Fail early on a bad offset rather than per bone
        let mut probe = blend_cur;
        probe.next_n_u8s(num_bones * ANIM_RECORD_SIZE)?;

        let mut bones = Vec::with_capacity(num_bones);
        for bone in 0..num_bones {
            let record = blend_cur + bone * ANIM_RECORD_SIZE;
            bones.push(read_bone_animation(record, num_frames, budget)?);
        }
        blends.push(bones);
    }

    Ok(blends)
}

fn read_bone_animation(record: Cur, num_frames: usize, budget: &mut DecodeBudget) -> Result<BoneAnimation> {
    fields!(record, anim {
        offsets: (fixed [u16; 6]),
    });

    let mut channels: [Vec<i16>; NUM_CHANNELS] = Default::default();
    for (channel, &off) in channels.iter_mut().zip(offsets.iter()) {
        if off != 0 {
            let data = record + off;
            budget.take(num_frames, data.pos())?;
            *channel = expand_channel(data, num_frames)?;
        }
    }
    Ok(BoneAnimation { channels })
}

/// Decodes a run-length encoded channel into one value per frame.
fn expand_channel(mut cur: Cur, num_frames: usize) -> Result<Vec<i16>> {
    // Each run needs at least four bytes for at most 255 frames, which
    // bounds how much a bogus frame count can make us allocate.
    let max_frames = (cur.bytes_remaining() / 4).saturating_mul(255);
    let mut values = Vec::with_capacity(num_frames.min(max_frames));

    while values.len() < num_frames {
        let (valid, total) = cur.next::<(u8, u8)>()?;
        if total == 0 {
            bail!("animation run at {:#x} covers no frames", cur.pos() - 2);
        }
        if valid == 0 {
            bail!("animation run at {:#x} has no values", cur.pos() - 2);
        }
        let run = cur.next_n::<i16>(valid as usize)?;
        let last = run.get(valid as usize - 1);

        let remaining = num_frames - values.len();
        let take = (total as usize).min(remaining);
        values.extend(run.take(take));
        let repeats = take.saturating_sub(valid as usize);
        values.extend(std::iter::repeat(last).take(repeats));
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(runs: &[(u8, u8, &[i16])]) -> Vec<u8> {
        let mut buf = vec![];
        for &(valid, total, vals) in runs {
            buf.push(valid);
            buf.push(total);
            for v in vals {
                buf.extend_from_slice(&v.to_le_bytes());
            }
        }
        buf
    }

    #[test]
    fn test_expand_repeats_last_valid_value() {
        let buf = bytes(&[(2, 5, &[10, 20][..]), (1, 2, &[-3][..])]);
        let vals = expand_channel(Cur::new(&buf), 7).unwrap();
        assert_eq!(vals, vec![10, 20, 20, 20, 20, -3, -3]);
    }

    #[test]
    fn test_expand_stops_at_frame_count() {
        let buf = bytes(&[(3, 3, &[1, 2, 3][..])]);
        assert_eq!(expand_channel(Cur::new(&buf), 2).unwrap(), vec![1, 2]);
        assert_eq!(expand_channel(Cur::new(&buf), 0).unwrap(), Vec::<i16>::new());
    }

    #[test]
    fn test_expand_rejects_bad_runs() {
        let buf = bytes(&[(1, 0, &[1][..])]);
        assert!(expand_channel(Cur::new(&buf), 1).is_err());

        let buf = bytes(&[(2, 2, &[1, 2][..])]);
        assert!(expand_channel(Cur::new(&buf), 3).is_err());
    }

    #[test]
    fn test_zero_offset_channel_is_empty() {
        // Record for one bone: only DOF 1 animated, data right after.
        let mut buf = vec![];
        for &off in &[0u16, 12, 0, 0, 0, 0] {
            buf.extend_from_slice(&off.to_le_bytes());
        }
        buf.extend(bytes(&[(1, 3, &[7][..])]));

        let mut budget = DecodeBudget::for_file_len(buf.len());
        let anims = read_animations(Cur::new(&buf), 1, 1, 3, &mut budget).unwrap();
        let bone = &anims[0][0];
        assert!(bone.channels[0].is_empty());
        assert_eq!(bone.channels[1], vec![7, 7, 7]);
        assert_eq!(bone.raw_value(0, 2), 0);
        assert_eq!(bone.raw_value(1, 2), 7);
    }

    #[test]
    fn test_shared_channel_data_is_metered() {
        // 50 bones whose six channels all point at the same 10 runs.
        let num_bones = 50;
        let records = num_bones * ANIM_RECORD_SIZE;
        let mut buf = vec![];
        for bone in 0..num_bones {
            let off = (records - bone * ANIM_RECORD_SIZE) as u16;
            for _ in 0..NUM_CHANNELS {
                buf.extend_from_slice(&off.to_le_bytes());
            }
        }
        for _ in 0..10 {
            buf.extend(bytes(&[(1, 255, &[1][..])]));
        }
        let num_frames = 10 * 255;

        let mut budget = DecodeBudget::for_file_len(buf.len());
        assert!(read_animations(Cur::new(&buf), 1, num_bones, num_frames, &mut budget).is_err());

        // One bone's worth still fits.
        let mut budget = DecodeBudget::for_file_len(buf.len());
        let anims = read_animations(Cur::new(&buf), 1, 1, num_frames, &mut budget).unwrap();
        assert_eq!(anims[0][0].channels[5].len(), num_frames);
    }
}
