//! Rig - the render host's live skeleton and face mesh
//!
//! The engine never owns scene graph data. It reads rest scales and the
//! morph dictionary at load time and writes joint scales, morph influences
//! and clip weights back through this trait every frame.

use std::collections::HashMap;

use lapwing_core::{JointSlot, DEFAULT_CONTROLS};

use crate::ClipSample;

/// 3D scale vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::one()
    }
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn one() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    /// Component-wise multiply
    pub fn scaled(&self, x: f32, y: f32, z: f32) -> Vec3 {
        Vec3 {
            x: self.x * x,
            y: self.y * y,
            z: self.z * z,
        }
    }

    /// Largest component difference
    pub fn max_abs_diff(&self, other: &Vec3) -> f32 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }
}

/// The renderable skeleton and mesh the engine mutates in place
pub trait Rig {
    /// Current local scale of a skeleton node
    fn joint_scale(&self, bone: &str) -> Option<Vec3>;

    /// Overwrite the local scale of a skeleton node (unknown bones are ignored)
    fn set_joint_scale(&mut self, bone: &str, scale: Vec3);

    /// Morph target names of a mesh node, in dictionary order.
    /// `None` if the node is missing or has no morph targets.
    fn morph_targets(&self, mesh: &str) -> Option<Vec<String>>;

    /// Dictionary index of a morph target
    fn morph_index(&self, mesh: &str, name: &str) -> Option<usize>;

    /// Write one morph influence
    fn set_morph_influence(&mut self, mesh: &str, index: usize, value: f32);

    /// Hand the blended clip set to the host for track sampling
    fn apply_clips(&mut self, samples: &[ClipSample]);
}

/// Face mesh with a morph dictionary
#[derive(Debug, Clone)]
struct FaceMesh {
    dictionary: HashMap<String, usize>,
    names: Vec<String>,
    influences: Vec<f32>,
}

/// In-memory rig for headless hosts and tests
#[derive(Debug, Clone, Default)]
pub struct SkeletonRig {
    bones: HashMap<String, Vec3>,
    meshes: HashMap<String, FaceMesh>,
    clips: Vec<ClipSample>,
}

impl SkeletonRig {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shipped character: every joint slot at unit scale,
    /// face mesh on the head node with the shipped controls.
    pub fn character() -> Self {
        let mut rig = SkeletonRig::new();
        for slot in JointSlot::all() {
            rig = rig.with_bone(slot.default_bone(), Vec3::one());
        }
        rig.with_face_mesh(JointSlot::Head.default_bone(), DEFAULT_CONTROLS.iter().copied())
    }

    pub fn with_bone(mut self, bone: &str, scale: Vec3) -> Self {
        self.bones.insert(bone.to_string(), scale);
        self
    }

    pub fn with_face_mesh<I, S>(mut self, mesh: &str, controls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = controls.into_iter().map(Into::into).collect();
        let dictionary = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        let influences = vec![0.0; names.len()];
        self.meshes.insert(
            mesh.to_string(),
            FaceMesh {
                dictionary,
                names,
                influences,
            },
        );
        self
    }

    pub fn remove_bone(&mut self, bone: &str) {
        self.bones.remove(bone);
    }

    pub fn remove_mesh(&mut self, mesh: &str) {
        self.meshes.remove(mesh);
    }

    /// Read a morph influence by control name
    pub fn morph_influence(&self, mesh: &str, name: &str) -> Option<f32> {
        let face = self.meshes.get(mesh)?;
        let index = *face.dictionary.get(name)?;
        face.influences.get(index).copied()
    }

    /// Clip set handed over by the last commit
    pub fn last_clips(&self) -> &[ClipSample] {
        &self.clips
    }
}

impl Rig for SkeletonRig {
    fn joint_scale(&self, bone: &str) -> Option<Vec3> {
        self.bones.get(bone).copied()
    }

    fn set_joint_scale(&mut self, bone: &str, scale: Vec3) {
        if let Some(existing) = self.bones.get_mut(bone) {
            *existing = scale;
        }
    }

    fn morph_targets(&self, mesh: &str) -> Option<Vec<String>> {
        self.meshes
            .get(mesh)
            .filter(|face| !face.names.is_empty())
            .map(|face| face.names.clone())
    }

    fn morph_index(&self, mesh: &str, name: &str) -> Option<usize> {
        self.meshes.get(mesh)?.dictionary.get(name).copied()
    }

    fn set_morph_influence(&mut self, mesh: &str, index: usize, value: f32) {
        if let Some(slot) = self
            .meshes
            .get_mut(mesh)
            .and_then(|face| face.influences.get_mut(index))
        {
            *slot = value;
        }
    }

    fn apply_clips(&mut self, samples: &[ClipSample]) {
        self.clips.clear();
        self.clips.extend_from_slice(samples);
    }
}
