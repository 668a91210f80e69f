//! Builds synthetic `IDST` files for tests.
//!
//! Sections are written in a deliberately scrambled order (sequences first,
//! header patched last) so the reader has to follow offsets.

use crate::studio::read::HEADER_SIZE;
use crate::studio::types::MotionTypes;
use crate::studio::{STUDIO_IDENT, STUDIO_VERSION};

pub struct TestBone {
    pub name: &'static str,
    pub parent: i32,
    pub value: [f32; 6],
    pub scale: [f32; 6],
}

pub struct TestController {
    pub bone: i32,
    pub motion_type: i32,
    pub start: f32,
    pub end: f32,
    pub rest: i32,
    pub index: i32,
}

pub struct TestSequence {
    pub label: &'static str,
    pub fps: f32,
    pub flags: i32,
    pub frame_count: i32,
    pub linear_movement: [f32; 3],
    pub blend_type: [i32; 2],
    pub blend_start: [f32; 2],
    pub blend_end: [f32; 2],
    pub sequence_group: i32,
    pub events: Vec<(i32, i32)>,
    /// `[blend][bone][channel]` raw frame values; empty channels get
    /// offset 0.
    pub animations: Vec<Vec<[Vec<i16>; 6]>>,
}

pub struct TestMesh {
    pub triangle_commands: Vec<i16>,
    pub num_norms: i32,
    pub skin: i32,
}

pub struct TestSubModel {
    pub name: &'static str,
    pub meshes: Vec<TestMesh>,
    /// (bone, position)
    pub vertices: Vec<(u8, [f32; 3])>,
    /// (bone, direction)
    pub normals: Vec<(u8, [f32; 3])>,
}

pub struct TestBodyPart {
    pub name: &'static str,
    pub base: i32,
    pub models: Vec<TestSubModel>,
}

pub struct TestTexture {
    pub name: &'static str,
    pub width: i32,
    pub height: i32,
}

pub struct TestFile {
    pub version: i32,
    pub bones: Vec<TestBone>,
    pub controllers: Vec<TestController>,
    pub sequences: Vec<TestSequence>,
    pub textures: Vec<TestTexture>,
    pub skin_families: Vec<Vec<i16>>,
    pub body_parts: Vec<TestBodyPart>,
    pub transitions: Vec<u8>,
    /// Written into the header instead of the real bone count.
    pub patch_bone_count: Option<i32>,
}

fn no_channels() -> [Vec<i16>; 6] {
    Default::default()
}

fn empty_sub_model(name: &'static str) -> TestSubModel {
    TestSubModel { name, meshes: vec![], vertices: vec![], normals: vec![] }
}

impl TestFile {
    /// Three bones, three controllers (two sharing logical index 0), an
    /// "idle" and an "aim" sequence, and two body parts: base 1 with three
    /// sub-models, base 3 with two.
    pub fn typical() -> TestFile {
        let ones = [1.0; 6];
        let bones = vec![
            TestBone { name: "Bip01", parent: -1, value: [0.0; 6], scale: ones },
            TestBone { name: "Bip01_Spine", parent: 0, value: [1.0, 2.0, 3.0, 0.0, 0.0, 0.0], scale: ones },
            TestBone { name: "Bip01_Head", parent: 1, value: [0.0; 6], scale: ones },
        ];

        let controllers = vec![
            TestController {
                bone: 2, motion_type: MotionTypes::XR.bits() as i32,
                start: -90.0, end: 90.0, rest: 0, index: 0,
            },
            TestController {
                bone: 1, motion_type: MotionTypes::X.bits() as i32,
                start: 0.0, end: 10.0, rest: 0, index: 0,
            },
            TestController {
                bone: 1, motion_type: MotionTypes::YR.bits() as i32,
                start: 0.0, end: 360.0, rest: 0, index: 4,
            },
        ];

        let mut idle_root = no_channels();
        idle_root[0] = vec![0, 1, 2, 3];
        let idle = TestSequence {
            label: "idle",
            fps: 30.0,
            flags: 1,
            frame_count: 4,
            linear_movement: [3.0, 4.0, 0.0],
            blend_type: [0, 0],
            blend_start: [0.0, 0.0],
            blend_end: [0.0, 0.0],
            sequence_group: 0,
            events: vec![(2, 1001)],
            animations: vec![vec![idle_root, no_channels(), no_channels()]],
        };

        let mut aim_a = no_channels();
        aim_a[3] = vec![5, 5];
        let mut aim_b = no_channels();
        aim_b[0] = vec![-1, 2];
        let aim = TestSequence {
            label: "aim",
            fps: 10.0,
            flags: 0,
            frame_count: 2,
            linear_movement: [0.0, 0.0, 0.0],
            blend_type: [MotionTypes::XR.bits() as i32, 0],
            blend_start: [-45.0, 0.0],
            blend_end: [45.0, 0.0],
            sequence_group: 0,
            events: vec![],
            animations: vec![
                vec![aim_a, no_channels(), no_channels()],
                vec![no_channels(), aim_b, no_channels()],
            ],
        };

        let body = TestSubModel {
            name: "body_ref",
            meshes: vec![
                TestMesh {
                    triangle_commands: vec![3, 0, 0, 0, 0, 1, 1, 0, 8, 2, 2, 8, 8, 0],
                    num_norms: 2,
                    skin: 0,
                },
                TestMesh {
                    triangle_commands: vec![-3, 0, 2, 0, 0, 1, 2, 0, 8, 2, 2, 8, 8, 0],
                    num_norms: 1,
                    skin: 0,
                },
            ],
            vertices: vec![(0, [0.0, 0.0, 0.0]), (1, [0.0, 1.0, 0.0]), (2, [1.0, 1.0, 0.0])],
            normals: vec![(0, [0.0, 0.0, 1.0]), (1, [0.0, 1.0, 0.0]), (2, [1.0, 0.0, 0.0])],
        };

        TestFile {
            version: STUDIO_VERSION,
            bones,
            controllers,
            sequences: vec![idle, aim],
            textures: vec![TestTexture { name: "skin.bmp", width: 4, height: 2 }],
            skin_families: vec![vec![0], vec![0]],
            body_parts: vec![
                TestBodyPart {
                    name: "body",
                    base: 1,
                    models: vec![body, empty_sub_model("body_alt"), empty_sub_model("blank")],
                },
                TestBodyPart {
                    name: "head",
                    base: 3,
                    models: vec![empty_sub_model("head"), empty_sub_model("helmet")],
                },
            ],
            transitions: vec![1, 2, 1, 2],
            patch_bone_count: None,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut w = Writer { buf: vec![0; HEADER_SIZE] };

        let seq_off = self.write_sequences(&mut w);

        let bone_off = w.pos();
        for bone in &self.bones {
            w.name(bone.name, 32);
            w.i32(bone.parent);
            w.i32(0);
            for _ in 0..6 { w.i32(-1); }
            for &v in &bone.value { w.f32(v); }
            for &s in &bone.scale { w.f32(s); }
        }

        let controller_off = w.pos();
        for c in &self.controllers {
            w.i32(c.bone);
            w.i32(c.motion_type);
            w.f32(c.start);
            w.f32(c.end);
            w.i32(c.rest);
            w.i32(c.index);
        }

        let (texture_off, texture_data_off) = self.write_textures(&mut w);

        let skin_off = w.pos();
        for family in &self.skin_families {
            for &s in family { w.i16(s); }
        }
        w.align4();

        let body_part_off = self.write_body_parts(&mut w);

        let hitbox_off = w.pos();
        w.i32(2);
        w.i32(1);
        w.vec3([-1.0, -1.0, -1.0]);
        w.vec3([1.0, 1.0, 1.0]);

        let attachment_off = w.pos();
        w.name("muzzle", 32);
        w.i32(0);
        w.i32(2);
        w.vec3([10.0, 0.0, 0.0]);
        w.vec3([1.0, 0.0, 0.0]);
        w.vec3([0.0, 1.0, 0.0]);
        w.vec3([0.0, 0.0, 1.0]);

        let seq_group_off = w.pos();
        w.name("default", 32);
        w.name("", 64);
        w.i32(0);
        w.i32(0);

        let transition_off = w.pos();
        w.buf.extend_from_slice(&self.transitions);
        w.align4();

        let length = w.pos();
        let num_transitions = (self.transitions.len() as f64).sqrt() as i32;
        let num_bones = self.patch_bone_count.unwrap_or(self.bones.len() as i32);

        let mut h = Writer { buf: vec![] };
        h.buf.extend_from_slice(STUDIO_IDENT);
        h.i32(self.version);
        h.name("test.mdl", 64);
        h.i32(length);
        h.vec3([0.0, 0.0, 64.0]);
        h.vec3([-16.0, -16.0, 0.0]);
        h.vec3([16.0, 16.0, 72.0]);
        h.vec3([0.0; 3]);
        h.vec3([0.0; 3]);
        h.i32(0);
        h.i32(num_bones);
        h.i32(bone_off);
        h.i32(self.controllers.len() as i32);
        h.i32(controller_off);
        h.i32(1);
        h.i32(hitbox_off);
        h.i32(self.sequences.len() as i32);
        h.i32(seq_off);
        h.i32(1);
        h.i32(seq_group_off);
        h.i32(self.textures.len() as i32);
        h.i32(texture_off);
        h.i32(texture_data_off);
        h.i32(self.skin_families.first().map_or(0, |f| f.len() as i32));
        h.i32(self.skin_families.len() as i32);
        h.i32(skin_off);
        h.i32(self.body_parts.len() as i32);
        h.i32(body_part_off);
        h.i32(1);
        h.i32(attachment_off);
        for _ in 0..4 { h.i32(0); }
        h.i32(num_transitions);
        h.i32(transition_off);
        assert_eq!(h.buf.len(), HEADER_SIZE);

        w.buf[..HEADER_SIZE].copy_from_slice(&h.buf);
        w.buf
    }

    /// Returns the offset of the sequence records.
    fn write_sequences(&self, w: &mut Writer) -> i32 {
        let num_bones = self.bones.len();
        let mut event_offs = vec![];
        let mut anim_offs = vec![];

        for seq in &self.sequences {
            event_offs.push(w.pos());
            for &(frame, event) in &seq.events {
                w.i32(frame);
                w.i32(event);
                w.i32(0);
                w.name("", 64);
            }

            // Records for every (blend, bone), then the value streams.
            let anim_off = w.pos();
            anim_offs.push(anim_off);
            let records = w.buf.len();
            w.buf.resize(records + seq.animations.len() * num_bones * 12, 0);
            for (b, blend) in seq.animations.iter().enumerate() {
                for (i, channels) in blend.iter().enumerate() {
                    let record = records + (b * num_bones + i) * 12;
                    for (j, values) in channels.iter().enumerate() {
                        if values.is_empty() {
                            continue;
                        }
                        let off = w.buf.len() - record;
                        w.patch_u16(record + j * 2, off as u16);
                        encode_channel(w, values);
                    }
                }
            }
            w.align4();
        }

        let seq_off = w.pos();
        for (i, seq) in self.sequences.iter().enumerate() {
            w.name(seq.label, 32);
            w.f32(seq.fps);
            w.i32(seq.flags);
            w.i32(0);
            w.i32(0);
            w.i32(seq.events.len() as i32);
            w.i32(event_offs[i]);
            w.i32(seq.frame_count);
            w.i32(0);
            w.i32(0);
            w.i32(0);
            w.i32(0);
            w.vec3(seq.linear_movement);
            w.i32(0);
            w.i32(0);
            w.vec3([0.0; 3]);
            w.vec3([0.0; 3]);
            w.i32(seq.animations.len() as i32);
            w.i32(anim_offs[i]);
            for &t in &seq.blend_type { w.i32(t); }
            for &s in &seq.blend_start { w.f32(s); }
            for &e in &seq.blend_end { w.f32(e); }
            w.i32(0);
            w.i32(seq.sequence_group);
            w.i32(1);
            w.i32(1);
            w.i32(0);
            w.i32(0);
        }

        seq_off
    }

    fn write_textures(&self, w: &mut Writer) -> (i32, i32) {
        let data_off = w.pos();
        let mut pixel_offs = vec![];
        for tex in &self.textures {
            pixel_offs.push(w.pos());
            let n = (tex.width * tex.height) as usize;
            w.buf.extend((0..n).map(|i| i as u8));
            w.buf.extend((0..256 * 3).map(|i| i as u8));
        }
        w.align4();

        let off = w.pos();
        for (tex, &pixels) in self.textures.iter().zip(pixel_offs.iter()) {
            w.name(tex.name, 64);
            w.i32(0);
            w.i32(tex.width);
            w.i32(tex.height);
            w.i32(pixels);
        }
        (off, data_off)
    }

    fn write_body_parts(&self, w: &mut Writer) -> i32 {
        let mut model_offs = vec![];
        for part in &self.body_parts {
            let mut sub_model_data = vec![];
            for model in &part.models {
                let vert_info_off = w.pos();
                for &(bone, _) in &model.vertices { w.buf.push(bone); }
                w.align4();
                let vert_off = w.pos();
                for &(_, pos) in &model.vertices { w.vec3(pos); }
                let norm_info_off = w.pos();
                for &(bone, _) in &model.normals { w.buf.push(bone); }
                w.align4();
                let norm_off = w.pos();
                for &(_, dir) in &model.normals { w.vec3(dir); }

                let mut tri_offs = vec![];
                for mesh in &model.meshes {
                    tri_offs.push(w.pos());
                    for &t in &mesh.triangle_commands { w.i16(t); }
                    w.align4();
                }
                let mesh_off = w.pos();
                for (mesh, &tri_off) in model.meshes.iter().zip(tri_offs.iter()) {
                    w.i32(0);
                    w.i32(tri_off);
                    w.i32(mesh.skin);
                    w.i32(mesh.num_norms);
                    w.i32(0);
                }

                sub_model_data.push((mesh_off, vert_info_off, vert_off, norm_info_off, norm_off));
            }

            model_offs.push(w.pos());
            for (model, &(mesh_off, vert_info_off, vert_off, norm_info_off, norm_off)) in
                part.models.iter().zip(sub_model_data.iter())
            {
                w.name(model.name, 64);
                w.i32(0);
                w.f32(1.0);
                w.i32(model.meshes.len() as i32);
                w.i32(mesh_off);
                w.i32(model.vertices.len() as i32);
                w.i32(vert_info_off);
                w.i32(vert_off);
                w.i32(model.normals.len() as i32);
                w.i32(norm_info_off);
                w.i32(norm_off);
                w.i32(0);
                w.i32(0);
            }
        }

        let off = w.pos();
        for (part, &model_off) in self.body_parts.iter().zip(model_offs.iter()) {
            w.name(part.name, 64);
            w.i32(part.models.len() as i32);
            w.i32(part.base);
            w.i32(model_off);
        }
        off
    }
}

/// Run-length encodes a channel, leaving trailing repeats implicit.
fn encode_channel(w: &mut Writer, values: &[i16]) {
    for chunk in values.chunks(255) {
        let last = chunk[chunk.len() - 1];
        let mut valid = chunk.len();
        while valid > 1 && chunk[valid - 2] == last {
            valid -= 1;
        }
        w.buf.push(valid as u8);
        w.buf.push(chunk.len() as u8);
        for &v in &chunk[..valid] { w.i16(v); }
    }
}

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn pos(&self) -> i32 { self.buf.len() as i32 }
    fn i32(&mut self, x: i32) { self.buf.extend_from_slice(&x.to_le_bytes()); }
    fn i16(&mut self, x: i16) { self.buf.extend_from_slice(&x.to_le_bytes()); }
    fn f32(&mut self, x: f32) { self.buf.extend_from_slice(&x.to_le_bytes()); }
    fn vec3(&mut self, v: [f32; 3]) {
        for &x in &v { self.f32(x); }
    }
    fn name(&mut self, s: &str, len: usize) {
        let start = self.buf.len();
        self.buf.resize(start + len, 0);
        let n = s.len().min(len - 1);
        self.buf[start..start + n].copy_from_slice(&s.as_bytes()[..n]);
    }
    fn patch_u16(&mut self, at: usize, x: u16) {
        self.buf[at..at + 2].copy_from_slice(&x.to_le_bytes());
    }
    fn align4(&mut self) {
        while self.buf.len() % 4 != 0 { self.buf.push(0); }
    }
}

#[test]
fn test_encode_channel_compresses_tail() {
    let mut w = Writer { buf: vec![] };
    encode_channel(&mut w, &[5, 5, 5]);
    assert_eq!(w.buf, vec![1, 3, 5, 0]);
}
