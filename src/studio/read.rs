//! Reads `IDST` studio model files.
//!
//! The header holds a (count, offset) pair for every section. Offsets are
//! absolute from the start of the file and sections can be in any order, so
//! each one is read by jumping to its offset rather than by consuming the
//! file front to back.

use smallvec::SmallVec;
use std::io::{Read, Seek, SeekFrom};
use crate::errors::{ErrorKind, Result};
use crate::studio::anim::{read_animations, DecodeBudget};
use crate::studio::types::*;
use crate::studio::{STUDIO_IDENT, STUDIO_VERSION};
use crate::util::cur::Cur;
use crate::util::name::{Name32, Name64};

pub const HEADER_SIZE: usize = 244;

const BONE_SIZE: usize = 112;
const BONE_CONTROLLER_SIZE: usize = 24;
const HITBOX_SIZE: usize = 32;
const SEQUENCE_SIZE: usize = 176;
const SEQUENCE_GROUP_SIZE: usize = 104;
const EVENT_SIZE: usize = 76;
const PIVOT_SIZE: usize = 20;
const TEXTURE_SIZE: usize = 80;
const BODY_PART_SIZE: usize = 76;
const SUB_MODEL_SIZE: usize = 112;
const MESH_SIZE: usize = 20;
const ATTACHMENT_SIZE: usize = 88;
const PALETTE_SIZE: usize = 256 * 3;

/// Cheap check whether `buf` starts with the studio model signature.
pub fn is_studio_file(buf: &[u8]) -> bool {
    buf.len() >= 4 && &buf[0..4] == STUDIO_IDENT
}

/// Like `is_studio_file`, but peeks at the start of a stream wherever it's
/// currently positioned. The stream position is restored afterwards.
pub fn is_studio_stream<R: Read + Seek + ?Sized>(source: &mut R) -> Result<bool> {
    let start = source.seek(SeekFrom::Current(0))?;
    source.seek(SeekFrom::Start(0))?;
    let mut ident = [0u8; 4];
    let mut got = 0;
    while got < ident.len() {
        match source.read(&mut ident[got..])? {
            0 => break,
            n => got += n,
        }
    }
    source.seek(SeekFrom::Start(start))?;
    Ok(got == ident.len() && &ident == STUDIO_IDENT)
}

/// Reads the whole stream from offset 0 and decodes it.
pub fn read_studio_stream<R: Read + Seek + ?Sized>(source: &mut R) -> Result<Option<StudioFile>> {
    let buf = read_stream(source)?;
    read_studio_file(&buf)
}

pub(crate) fn read_stream<R: Read + Seek + ?Sized>(source: &mut R) -> Result<Vec<u8>> {
    source.seek(SeekFrom::Start(0))?;
    let mut buf = vec![];
    source.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Decodes a studio model.
///
/// Returns `Ok(None)` if the buffer doesn't start with the studio signature,
/// so callers can go on to try other formats. Anything wrong past that point
/// is an error and no partial file is returned.
pub fn read_studio_file(buf: &[u8]) -> Result<Option<StudioFile>> {
    if !is_studio_file(buf) {
        return Ok(None);
    }
    read_recognized(buf).map(Some)
}

fn read_recognized(buf: &[u8]) -> Result<StudioFile> {
    let cur = Cur::new(buf);

    fields!(cur, header {
        ident: [u8; 4],
        version: i32,
        name: Name64,
        length: i32,
        eye_position: Vec3,
        min: Vec3,
        max: Vec3,
        bbmin: Vec3,
        bbmax: Vec3,
        flags: i32,
        num_bones: i32,
        bone_off: i32,
        num_bone_controllers: i32,
        bone_controller_off: i32,
        num_hitboxes: i32,
        hitbox_off: i32,
        num_seqs: i32,
        seq_off: i32,
        num_seq_groups: i32,
        seq_group_off: i32,
        num_textures: i32,
        texture_off: i32,
        _texture_data_off: i32,
        num_skin_refs: i32,
        num_skin_families: i32,
        skin_off: i32,
        num_body_parts: i32,
        body_part_off: i32,
        num_attachments: i32,
        attachment_off: i32,
        _sound_table: i32,
        _sound_off: i32,
        _sound_groups: i32,
        _sound_group_off: i32,
        num_transitions: i32,
        transition_off: i32,
    });

    check!(ident == STUDIO_IDENT)?;
    if version != STUDIO_VERSION {
        bail!(ErrorKind::UnsupportedVersion(version));
    }

    debug!("studio model: {:?}", name);

    if length < HEADER_SIZE as i32 {
        bail!("header length {} is smaller than the header itself", length);
    }
    if length as usize > buf.len() {
        bail!("file is truncated: header says {} bytes, got {}", length, buf.len());
    }
    if (length as usize) < buf.len() {
        debug!("ignoring {} trailing bytes", buf.len() - length as usize);
    }
    // Everything lives inside the first `length` bytes.
    let cur = Cur::new(&buf[..length as usize]);

    let num_bones = count(num_bones, "bones")?;
    let bones = read_records(cur, bone_off, num_bones, BONE_SIZE, read_bone)?;
    validate_bone_hierarchy(&bones)?;

    let bone_controllers = read_records(
        cur,
        bone_controller_off,
        count(num_bone_controllers, "bone controllers")?,
        BONE_CONTROLLER_SIZE,
        |c| read_bone_controller(c, num_bones),
    )?;

    let hitboxes = read_records(
        cur, hitbox_off, count(num_hitboxes, "hitboxes")?, HITBOX_SIZE, read_hitbox,
    )?;

    let mut anim_budget = DecodeBudget::for_file_len(length as usize);
    let sequences = read_records(
        cur,
        seq_off,
        count(num_seqs, "sequences")?,
        SEQUENCE_SIZE,
        |c| read_sequence(cur, c, num_bones, &mut anim_budget),
    )?;

    let sequence_groups = read_records(
        cur,
        seq_group_off,
        count(num_seq_groups, "sequence groups")?,
        SEQUENCE_GROUP_SIZE,
        read_sequence_group,
    )?;

    let textures = read_records(
        cur,
        texture_off,
        count(num_textures, "textures")?,
        TEXTURE_SIZE,
        |c| read_texture(cur, c),
    )?;

    let skin_families = read_skin_families(
        cur,
        skin_off,
        count(num_skin_refs, "skin refs")?,
        count(num_skin_families, "skin families")?,
    )?;

    let body_parts = read_records(
        cur,
        body_part_off,
        count(num_body_parts, "body parts")?,
        BODY_PART_SIZE,
        |c| read_body_part(cur, c),
    )?;

    let attachments = read_records(
        cur,
        attachment_off,
        count(num_attachments, "attachments")?,
        ATTACHMENT_SIZE,
        read_attachment,
    )?;

    let transition_count = count(num_transitions, "transitions")?;
    let transitions = read_transitions(cur, transition_off, transition_count)?;

    Ok(StudioFile {
        name,
        eye_position,
        min,
        max,
        bbmin,
        bbmax,
        flags,
        bones,
        bone_controllers,
        hitboxes,
        sequences,
        sequence_groups,
        textures,
        skin_families,
        body_parts,
        attachments,
        transitions,
        transition_count,
    })
}

/// Validates a count read from the file.
fn count(n: i32, what: &str) -> Result<usize> {
    if n < 0 {
        bail!("negative number of {}: {}", what, n);
    }
    Ok(n as usize)
}

/// Reads `count` fixed-size records starting at `off`. The whole span is
/// bounds-checked up front so a bogus count fails before anything is
/// allocated for it.
fn read_records<'a, T, F>(base: Cur<'a>, off: i32, count: usize, size: usize, mut f: F) -> Result<Vec<T>>
where F: FnMut(Cur<'a>) -> Result<T>
{
    if count == 0 {
        return Ok(vec![]);
    }
    let start = base.at(off)?;
    let span = match count.checked_mul(size) {
        Some(x) => x,
        None => bail!(ErrorKind::OutOfBounds(start.pos(), usize::max_value(), start.buf_len())),
    };
    let mut probe = start;
    probe.next_n_u8s(span)?;

    let mut records = Vec::with_capacity(count);
    for i in 0..count {
        records.push(f(start + i * size)?);
    }
    Ok(records)
}

fn read_bone(cur: Cur) -> Result<Bone> {
    fields!(cur, bone {
        name: Name32,
        parent: i32,
        flags: i32,
        bone_controllers: (fixed [i32; 6]),
        value: (fixed [f32; 6]),
        scale: (fixed [f32; 6]),
    });

    let parent = match parent {
        -1 => None,
        p if p >= 0 => Some(p as usize),
        p => bail!("bone {:?} has invalid parent {}", name, p),
    };

    Ok(Bone { name, parent, flags, bone_controllers, value, scale })
}

/// Parents must be in range and the hierarchy must be a forest.
fn validate_bone_hierarchy(bones: &[Bone]) -> Result<()> {
    for (i, bone) in bones.iter().enumerate() {
        let mut cur = bone.parent;
        let mut steps = 0;
        while let Some(p) = cur {
            if p >= bones.len() {
                bail!("bone {} ({:?}) has out-of-range parent {}", i, bone.name, p);
            }
            steps += 1;
            if p == i || steps > bones.len() {
                bail!("bone {} ({:?}) is part of a parent cycle", i, bone.name);
            }
            cur = bones[p].parent;
        }
    }
    Ok(())
}

fn read_bone_controller(cur: Cur, num_bones: usize) -> Result<BoneController> {
    fields!(cur, bone_controller {
        bone: i32,
        motion_type: i32,
        start: f32,
        end: f32,
        rest: i32,
        index: i32,
    });

    let bone = if bone >= 0 && (bone as usize) < num_bones {
        Some(bone as usize)
    } else {
        if bone != -1 {
            warn!("bone controller {} refers to nonexistent bone {}", index, bone);
        }
        None
    };

    Ok(BoneController {
        bone,
        motion_type: MotionTypes::from_raw(motion_type),
        start,
        end,
        rest,
        index,
    })
}

fn read_hitbox(cur: Cur) -> Result<Hitbox> {
    fields!(cur, hitbox {
        bone: i32,
        group: i32,
        bbmin: Vec3,
        bbmax: Vec3,
    });
    Ok(Hitbox { bone, group, bbmin, bbmax })
}

fn read_sequence_group(cur: Cur) -> Result<SequenceGroup> {
    fields!(cur, sequence_group {
        label: Name32,
        name: Name64,
        _unused1: i32,
        _unused2: i32,
    });
    Ok(SequenceGroup { label, name })
}

fn read_sequence<'a>(
    base: Cur<'a>,
    cur: Cur<'a>,
    num_bones: usize,
    anim_budget: &mut DecodeBudget,
) -> Result<Sequence> {
    fields!(cur, sequence {
        label: Name32,
        fps: f32,
        flags: i32,
        activity: i32,
        activity_weight: i32,
        num_events: i32,
        event_off: i32,
        frame_count: i32,
        num_pivots: i32,
        pivot_off: i32,
        motion_type: i32,
        motion_bone: i32,
        linear_movement: Vec3,
        _automove_pos_off: i32,
        _automove_angle_off: i32,
        bbmin: Vec3,
        bbmax: Vec3,
        num_blends: i32,
        anim_off: i32,
        blend_type: (fixed [i32; 2]),
        blend_start: (fixed [f32; 2]),
        blend_end: (fixed [f32; 2]),
        blend_parent: i32,
        sequence_group: i32,
        entry_node: i32,
        exit_node: i32,
        node_flags: i32,
        next_sequence: i32,
    });

    debug!("sequence: {:?}", label);

    if frame_count < 0 {
        bail!("sequence {:?} has negative frame count {}", label, frame_count);
    }
    let num_blends = count(num_blends, "blends")?;
    if num_blends > MAX_BLENDS {
        bail!("sequence {:?} has {} blends, at most {} are supported",
            label, num_blends, MAX_BLENDS);
    }

    let events = read_records(
        base, event_off, count(num_events, "events")?, EVENT_SIZE, read_event,
    )?;
    let pivots = read_records(
        base, pivot_off, count(num_pivots, "pivots")?, PIVOT_SIZE, read_pivot,
    )?;

    let mut blends = [Blend { motion_type: MotionTypes::empty(), start: 0.0, end: 0.0 }; MAX_BLEND_CHANNELS];
    for (i, blend) in blends.iter_mut().enumerate() {
        *blend = Blend {
            motion_type: MotionTypes::from_raw(blend_type[i]),
            start: blend_start[i],
            end: blend_end[i],
        };
    }

    // Group 0 is this file; the others are separate files we don't have.
    let animations = if sequence_group == 0 {
        read_animations(base.at(anim_off)?, num_blends, num_bones, frame_count as usize, anim_budget)?
    } else {
        debug!("sequence {:?} is in external group {}", label, sequence_group);
        SmallVec::new()
    };

    Ok(Sequence {
        label,
        fps,
        flags: SequenceFlags::from_bits_retain(flags as u32),
        activity,
        activity_weight,
        events,
        frame_count,
        pivots,
        motion_type: MotionTypes::from_raw(motion_type),
        motion_bone,
        linear_movement,
        bbmin,
        bbmax,
        blends,
        blend_parent,
        sequence_group,
        entry_node,
        exit_node,
        node_flags,
        next_sequence,
        animations,
    })
}

fn read_event(cur: Cur) -> Result<Event> {
    fields!(cur, event {
        frame: i32,
        event: i32,
        event_type: i32,
        options: Name64,
    });
    Ok(Event { frame, event, event_type, options })
}

fn read_pivot(cur: Cur) -> Result<Pivot> {
    fields!(cur, pivot {
        origin: Vec3,
        start: i32,
        end: i32,
    });
    Ok(Pivot { origin, start, end })
}

fn read_texture<'a>(base: Cur<'a>, cur: Cur<'a>) -> Result<Texture> {
    fields!(cur, texture {
        name: Name64,
        flags: i32,
        width: i32,
        height: i32,
        index: i32,
    });

    debug!("texture: {:?} ({}x{})", name, width, height);

    check!(width >= 0 && height >= 0)?;

    let (pixels, palette) = if index > 0 {
        let num_pixels = match (width as usize).checked_mul(height as usize) {
            Some(n) => n,
            None => bail!("texture {:?} is impossibly large", name),
        };
        let mut data = base.at(index)?;
        let pixels = data.next_n_u8s(num_pixels)?.to_vec();
        let palette = data.next_n_u8s(PALETTE_SIZE)?
            .chunks(3)
            .map(|rgb| [rgb[0], rgb[1], rgb[2]])
            .collect();
        (pixels, palette)
    } else {
        (vec![], vec![])
    };

    Ok(Texture {
        name,
        flags: TextureFlags::from_bits_retain(flags as u32),
        width,
        height,
        pixels,
        palette,
    })
}

fn read_skin_families(base: Cur, off: i32, num_refs: usize, num_families: usize) -> Result<Vec<Vec<i16>>> {
    if num_refs == 0 || num_families == 0 {
        return Ok(vec![]);
    }
    let mut cur = base.at(off)?;
    let mut families = Vec::with_capacity(num_families.min(cur.bytes_remaining()));
    for _ in 0..num_families {
        families.push(cur.next_n::<i16>(num_refs)?.collect());
    }
    Ok(families)
}

fn read_body_part<'a>(base: Cur<'a>, cur: Cur<'a>) -> Result<BodyPart> {
    fields!(cur, body_part {
        name: Name64,
        num_models: i32,
        base_value: i32,
        model_off: i32,
    });

    debug!("body part: {:?}", name);

    // Packed body values are decoded by dividing by this.
    if base_value <= 0 {
        bail!("body part {:?} has non-positive base {}", name, base_value);
    }

    let models = read_records(
        base,
        model_off,
        count(num_models, "sub-models")?,
        SUB_MODEL_SIZE,
        |c| read_sub_model(base, c),
    )?;

    Ok(BodyPart { name, base: base_value as u32, models })
}

fn read_sub_model<'a>(base: Cur<'a>, cur: Cur<'a>) -> Result<SubModel> {
    fields!(cur, sub_model {
        name: Name64,
        model_type: i32,
        bounding_radius: f32,
        num_meshes: i32,
        mesh_off: i32,
        num_verts: i32,
        vert_info_off: i32,
        vert_off: i32,
        num_norms: i32,
        norm_info_off: i32,
        norm_off: i32,
        _num_groups: i32,
        _group_off: i32,
    });

    debug!("sub-model: {:?}", name);

    let num_verts = count(num_verts, "vertices")?;
    let vertices = if num_verts == 0 {
        vec![]
    } else {
        let vert_bones = base.at(vert_info_off)?.next_n::<u8>(num_verts)?;
        let positions = base.at(vert_off)?.next_n::<Vec3>(num_verts)?;
        vert_bones.zip(positions)
            .map(|(bone, position)| BoundVertex { bone, position })
            .collect()
    };

    let num_norms = count(num_norms, "normals")?;
    let normals: Vec<NormalInfo> = if num_norms == 0 {
        vec![]
    } else {
        let norm_bones = base.at(norm_info_off)?.next_n::<u8>(num_norms)?;
        let dirs = base.at(norm_off)?.next_n::<Vec3>(num_norms)?;
        norm_bones.zip(dirs)
            .map(|(bone, normal)| NormalInfo { bone: bone as i32, normal })
            .collect()
    };

    // Each mesh owns the next `num_norms` normals of the sub-model.
    let mut norm_start = 0;
    let meshes = read_records(
        base,
        mesh_off,
        count(num_meshes, "meshes")?,
        MESH_SIZE,
        |c| {
            let mesh = read_mesh(base, c, &normals, norm_start)?;
            norm_start += mesh.normals.len();
            Ok(mesh)
        },
    )?;

    Ok(SubModel { name, model_type, bounding_radius, meshes, vertices, normals })
}

fn read_mesh<'a>(base: Cur<'a>, cur: Cur<'a>, normals: &[NormalInfo], norm_start: usize) -> Result<BodyMesh> {
    fields!(cur, mesh {
        _num_tris: i32,
        tri_off: i32,
        skin: i32,
        num_norms: i32,
        _norm_off: i32,
    });

    let num_norms = count(num_norms, "mesh normals")?;
    let norm_end = norm_start.saturating_add(num_norms);
    if norm_end > normals.len() {
        bail!("mesh normals {}..{} exceed the {} normals of its model",
            norm_start, norm_end, normals.len());
    }

    let triangle_commands = read_triangle_commands(base.at(tri_off)?)?;

    Ok(BodyMesh {
        triangle_commands,
        normals: normals[norm_start..norm_end].to_vec(),
        skin,
    })
}

/// Reads a 0-terminated strip/fan command stream.
fn read_triangle_commands(mut cur: Cur) -> Result<Vec<i16>> {
    let mut cmds = vec![];
    loop {
        let n = cur.next::<i16>()?;
        cmds.push(n);
        if n == 0 {
            break;
        }
        let num_tokens = (n as i32).abs() as usize * 4;
        cmds.extend(cur.next_n::<i16>(num_tokens)?);
    }
    trace!("triangle commands: {} tokens", cmds.len());
    Ok(cmds)
}

fn read_attachment(cur: Cur) -> Result<Attachment> {
    fields!(cur, attachment {
        name: Name32,
        attachment_type: i32,
        bone: i32,
        origin: Vec3,
        vector0: Vec3,
        vector1: Vec3,
        vector2: Vec3,
    });
    Ok(Attachment {
        name,
        attachment_type,
        bone,
        origin,
        vectors: [vector0, vector1, vector2],
    })
}

fn read_transitions(base: Cur, off: i32, n: usize) -> Result<Vec<u8>> {
    if n == 0 {
        return Ok(vec![]);
    }
    let len = match n.checked_mul(n) {
        Some(x) => x,
        None => bail!("transition table of {} nodes is impossibly large", n),
    };
    Ok(base.at(off)?.next_n_u8s(len)?.to_vec())
}
