//! Decoded studio model data.
//!
//! Everything here is built once by `read_studio_file` and never mutated
//! afterwards. Array order is index identity: a bone's position in `bones` is
//! the index other records use to refer to it.

use cgmath::{InnerSpace, Vector3};
use smallvec::SmallVec;
use crate::util::name::{Name32, Name64};

pub type Vec3 = Vector3<f32>;

/// Number of blend channels (axes) a sequence can have.
pub const MAX_BLEND_CHANNELS: usize = 2;
/// Number of animation sets a sequence can blend between.
pub const MAX_BLENDS: usize = 4;
/// Degrees of freedom per bone: X, Y, Z, XR, YR, ZR.
pub const NUM_CHANNELS: usize = 6;

bitflags! {
    /// Motion axes of a controller, blend channel or sequence.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MotionTypes: u32 {
        const X = 0x0001;
        const Y = 0x0002;
        const Z = 0x0004;
        const XR = 0x0008;
        const YR = 0x0010;
        const ZR = 0x0020;
        const LX = 0x0040;
        const LY = 0x0080;
        const LZ = 0x0100;
        const AX = 0x0200;
        const AY = 0x0400;
        const AZ = 0x0800;
        const AXR = 0x1000;
        const AYR = 0x2000;
        const AZR = 0x4000;
        /// Controller that wraps shortest distance.
        const RLOOP = 0x8000;

        const ROTATION = Self::XR.bits() | Self::YR.bits() | Self::ZR.bits();
    }
}

impl MotionTypes {
    /// Unknown bits are kept so the value round-trips.
    pub fn from_raw(raw: i32) -> MotionTypes {
        MotionTypes::from_bits_retain(raw as u32)
    }

    pub fn is_rotation(self) -> bool {
        self.intersects(MotionTypes::ROTATION)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SequenceFlags: u32 {
        const LOOPING = 0x0001;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureFlags: u32 {
        const FLATSHADE = 0x0001;
        const CHROME = 0x0002;
        const FULLBRIGHT = 0x0004;
        const NOMIPS = 0x0008;
        const ALPHA = 0x0010;
        const ADDITIVE = 0x0020;
        const MASKED = 0x0040;
    }
}

/// A decoded `IDST` studio model.
pub struct StudioFile {
    pub name: Name64,
    pub eye_position: Vec3,
    /// Ideal movement hull.
    pub min: Vec3,
    pub max: Vec3,
    /// Clipping bounding box.
    pub bbmin: Vec3,
    pub bbmax: Vec3,
    pub flags: i32,

    pub bones: Vec<Bone>,
    pub bone_controllers: Vec<BoneController>,
    pub hitboxes: Vec<Hitbox>,
    pub sequences: Vec<Sequence>,
    pub sequence_groups: Vec<SequenceGroup>,
    pub textures: Vec<Texture>,
    /// `skin_families[family][skin_ref]` is a texture index.
    pub skin_families: Vec<Vec<i16>>,
    pub body_parts: Vec<BodyPart>,
    pub attachments: Vec<Attachment>,
    /// Square matrix of transition nodes, `transitions[from * n + to]`.
    pub transitions: Vec<u8>,
    pub transition_count: usize,
}

impl StudioFile {
    /// Next node on the way from transition node `from` to `to`. Node
    /// numbers are 1-based as stored in sequences.
    pub fn transition(&self, from: usize, to: usize) -> Option<u8> {
        if from == 0 || to == 0 || from > self.transition_count || to > self.transition_count {
            return None;
        }
        self.transitions.get((from - 1) * self.transition_count + (to - 1)).cloned()
    }
}

pub struct Bone {
    pub name: Name32,
    /// `None` for root bones.
    pub parent: Option<usize>,
    pub flags: i32,
    /// Controller array index driving each DOF, -1 for none.
    pub bone_controllers: [i32; NUM_CHANNELS],
    /// Default position (0..3) and rotation (3..6).
    pub value: [f32; NUM_CHANNELS],
    /// Scale applied to compressed animation values per DOF.
    pub scale: [f32; NUM_CHANNELS],
}

impl Bone {
    pub fn position(&self) -> Vec3 {
        Vector3::new(self.value[0], self.value[1], self.value[2])
    }

    pub fn rotation(&self) -> Vec3 {
        Vector3::new(self.value[3], self.value[4], self.value[5])
    }

    /// Decompresses a raw animation value for one DOF.
    pub fn channel_value(&self, channel: usize, raw: i16) -> f32 {
        self.value[channel] + raw as f32 * self.scale[channel]
    }
}

pub struct BoneController {
    /// Bone this controller is attached to; `None` if the file says -1.
    pub bone: Option<usize>,
    pub motion_type: MotionTypes,
    pub start: f32,
    /// May be less than `start` to signal an inverted axis.
    pub end: f32,
    pub rest: i32,
    /// Logical controller slot. Several records may share one.
    pub index: i32,
}

pub struct Hitbox {
    pub bone: i32,
    pub group: i32,
    pub bbmin: Vec3,
    pub bbmax: Vec3,
}

pub struct SequenceGroup {
    pub label: Name32,
    pub name: Name64,
}

pub struct Sequence {
    pub label: Name32,
    pub fps: f32,
    pub flags: SequenceFlags,
    pub activity: i32,
    pub activity_weight: i32,
    pub events: Vec<Event>,
    pub frame_count: i32,
    pub pivots: Vec<Pivot>,
    pub motion_type: MotionTypes,
    pub motion_bone: i32,
    /// Root motion over one full cycle.
    pub linear_movement: Vec3,
    pub bbmin: Vec3,
    pub bbmax: Vec3,
    /// Blend channel descriptors, addressed positionally. Inactive channels
    /// have an empty `motion_type`.
    pub blends: [Blend; MAX_BLEND_CHANNELS],
    pub blend_parent: i32,
    pub sequence_group: i32,
    pub entry_node: i32,
    pub exit_node: i32,
    pub node_flags: i32,
    pub next_sequence: i32,
    /// One animation set per blend; each holds one entry per bone. Empty if
    /// the data lives in an external sequence group file.
    pub animations: SmallVec<[Vec<BoneAnimation>; MAX_BLENDS]>,
}

impl Sequence {
    pub fn is_looping(&self) -> bool {
        self.flags.contains(SequenceFlags::LOOPING)
    }

    pub fn ground_distance(&self) -> f32 {
        self.linear_movement.magnitude()
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Blend {
    pub motion_type: MotionTypes,
    pub start: f32,
    pub end: f32,
}

pub struct Event {
    pub frame: i32,
    pub event: i32,
    pub event_type: i32,
    pub options: Name64,
}

pub struct Pivot {
    pub origin: Vec3,
    pub start: i32,
    pub end: i32,
}

/// Per-frame raw values of one bone's six DOFs in one animation set.
/// A channel with no data is empty and reads as 0 on every frame.
pub struct BoneAnimation {
    pub channels: [Vec<i16>; NUM_CHANNELS],
}

impl BoneAnimation {
    pub fn raw_value(&self, channel: usize, frame: usize) -> i16 {
        self.channels[channel].get(frame).cloned().unwrap_or(0)
    }
}

pub struct Texture {
    pub name: Name64,
    pub flags: TextureFlags,
    pub width: i32,
    pub height: i32,
    /// 8-bit palette indices, `width * height` of them. Empty when the
    /// texture data isn't stored in this file.
    pub pixels: Vec<u8>,
    /// 256 RGB entries, or empty along with `pixels`.
    pub palette: Vec<[u8; 3]>,
}

pub struct BodyPart {
    pub name: Name64,
    /// Radix weight of this part's digit in a packed body value.
    pub base: u32,
    pub models: Vec<SubModel>,
}

/// One selectable mesh variant of a body part.
pub struct SubModel {
    pub name: Name64,
    pub model_type: i32,
    pub bounding_radius: f32,
    pub meshes: Vec<BodyMesh>,
    pub vertices: Vec<BoundVertex>,
    pub normals: Vec<NormalInfo>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundVertex {
    pub bone: u8,
    pub position: Vec3,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NormalInfo {
    pub bone: i32,
    pub normal: Vec3,
}

pub struct BodyMesh {
    /// Strip/fan command stream, including the terminating 0.
    pub triangle_commands: Vec<i16>,
    /// This mesh's slice of the sub-model normals.
    pub normals: Vec<NormalInfo>,
    pub skin: i32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    Strip,
    Fan,
}

/// One strip or fan. `verts` holds `(vertex, normal, s, t)` quadruples.
#[derive(Copy, Clone, Debug)]
pub struct TriangleCommand<'a> {
    pub kind: PrimitiveKind,
    pub verts: &'a [i16],
}

impl<'a> TriangleCommand<'a> {
    pub fn num_verts(&self) -> usize {
        self.verts.len() / 4
    }

    /// `(vertex, normal, s, t)` of the `i`th vertex.
    pub fn vert(&self, i: usize) -> (i16, i16, i16, i16) {
        let v = &self.verts[i * 4..i * 4 + 4];
        (v[0], v[1], v[2], v[3])
    }
}

impl BodyMesh {
    /// Iterates over the strips and fans in the command stream.
    pub fn commands(&self) -> TriangleCommands {
        TriangleCommands { cmds: &self.triangle_commands }
    }
}

pub struct TriangleCommands<'a> {
    cmds: &'a [i16],
}

impl<'a> Iterator for TriangleCommands<'a> {
    type Item = TriangleCommand<'a>;

    fn next(&mut self) -> Option<TriangleCommand<'a>> {
        let (&n, rest) = self.cmds.split_first()?;
        if n == 0 {
            self.cmds = &[];
            return None;
        }
        let kind = if n < 0 { PrimitiveKind::Fan } else { PrimitiveKind::Strip };
        // The decoder guarantees the stream is well-formed.
        let len = (n as i32).abs() as usize * 4;
        let len = len.min(rest.len());
        let (verts, rest) = rest.split_at(len);
        self.cmds = rest;
        Some(TriangleCommand { kind, verts })
    }
}

pub struct Attachment {
    pub name: Name32,
    pub attachment_type: i32,
    pub bone: i32,
    pub origin: Vec3,
    pub vectors: [Vec3; 3],
}

#[test]
fn test_triangle_command_iter() {
    let mesh = BodyMesh {
        triangle_commands: vec![
            3, 0, 0, 0, 0, 1, 1, 0, 0, 2, 2, 0, 0,
            -3, 3, 3, 1, 1, 4, 4, 1, 1, 5, 5, 1, 1,
            0,
        ],
        normals: vec![],
        skin: 0,
    };
    let cmds: Vec<_> = mesh.commands().collect();
    assert_eq!(cmds.len(), 2);
    assert_eq!(cmds[0].kind, PrimitiveKind::Strip);
    assert_eq!(cmds[1].kind, PrimitiveKind::Fan);
    assert_eq!(cmds[1].num_verts(), 3);
    assert_eq!(cmds[1].vert(2), (5, 5, 1, 1));
}

#[test]
fn test_motion_types() {
    assert!(MotionTypes::from_raw(0x10).is_rotation());
    assert!(!MotionTypes::from_raw(0x1 | 0x8000).is_rotation());
    assert!(MotionTypes::from_raw(0).is_empty());
    assert_eq!(MotionTypes::from_raw(0x10000).bits(), 0x10000);
}
