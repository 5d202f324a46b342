//! glTF 2.0 Loader
//!
//! Decodes a glTF/GLB byte stream into a [`Prefab`]: geometries and
//! materials go straight into the [`AssetServer`], node topology and
//! animation clips into the prefab. No scene access happens here, so the
//! whole decode can run on the asset runtime.

use std::sync::Arc;

use glam::{Quat, Vec3, Vec4};

use crate::animation::binding::TargetPath;
use crate::animation::clip::{AnimationClip, Track, TrackData, TrackMeta};
use crate::animation::tracks::{InterpolationMode, KeyframeTrack};
use crate::assets::prefab::{Prefab, PrefabNode};
use crate::assets::server::{AssetServer, MaterialHandle};
use crate::errors::{ArdentError, Result};
use crate::resources::geometry::Geometry;
use crate::resources::material::Material;
use crate::resources::mesh::Mesh;

pub struct GltfLoader {
    assets: AssetServer,
}

impl GltfLoader {
    #[must_use]
    pub fn new(assets: AssetServer) -> Self {
        Self { assets }
    }

    /// Decodes a glTF or GLB byte stream. `name` labels log output and
    /// unnamed animation clips.
    pub fn load_from_bytes(&self, bytes: &[u8], name: &str) -> Result<Prefab> {
        let (document, buffers, _images) = gltf::import_slice(bytes)?;

        log::debug!(
            "Decoding glTF '{name}': {} nodes, {} meshes, {} animations",
            document.nodes().count(),
            document.meshes().count(),
            document.animations().count()
        );

        // Materials, indexed to match the document. The extra entry at the
        // end backs primitives without a material.
        let mut material_handles: Vec<MaterialHandle> = Vec::new();
        for gltf_mat in document.materials() {
            material_handles.push(self.load_material(&gltf_mat));
        }
        let default_material = self
            .assets
            .add_material(Material::new_lambert(Vec4::ONE));

        // Per-mesh list of decoded primitives.
        let mut mesh_primitives: Vec<Vec<Mesh>> = Vec::new();
        for gltf_mesh in document.meshes() {
            let mesh_name = gltf_mesh
                .name()
                .map_or_else(|| format!("Mesh_{}", gltf_mesh.index()), str::to_string);

            let mut primitives = Vec::new();
            for primitive in gltf_mesh.primitives() {
                let geometry = self.load_geometry(&primitive, &buffers, &mesh_name)?;
                let geometry_handle = self.assets.add_geometry(geometry);

                let material_handle = primitive
                    .material()
                    .index()
                    .map_or(default_material, |i| material_handles[i]);

                primitives.push(Mesh::new(geometry_handle, material_handle).with_name(&mesh_name));
            }
            mesh_primitives.push(primitives);
        }

        let mut prefab = Prefab::new();
        self.load_nodes(&document, &mesh_primitives, &mut prefab);
        prefab.animations = self.load_animations(&document, &buffers, name)?;

        Ok(prefab)
    }

    fn load_material(&self, gltf_mat: &gltf::Material) -> MaterialHandle {
        let pbr = gltf_mat.pbr_metallic_roughness();
        let base_color = Vec4::from_array(pbr.base_color_factor());

        let mut material = Material::new_lambert(base_color);
        if let Some(name) = gltf_mat.name() {
            material.name = name.to_string();
        }
        material.double_sided = gltf_mat.double_sided();
        material.transparent = matches!(gltf_mat.alpha_mode(), gltf::material::AlphaMode::Blend);
        material.opacity = base_color.w;

        self.assets.add_material(material)
    }

    fn load_geometry(
        &self,
        primitive: &gltf::Primitive,
        buffers: &[gltf::buffer::Data],
        mesh_name: &str,
    ) -> Result<Geometry> {
        let reader = primitive.reader(|buffer| Some(&*buffers[buffer.index()]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| {
                ArdentError::GltfError(format!("Mesh '{mesh_name}' primitive has no positions"))
            })?
            .collect();

        let mut geometry = Geometry::new();
        geometry.name = mesh_name.to_string();

        geometry.indices = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            // Non-indexed primitive: trivial index list.
            None => (0..positions.len() as u32).collect(),
        };

        if let Some(uvs) = reader.read_tex_coords(0) {
            geometry.uvs = uvs.into_f32().collect();
        }

        geometry.positions = positions;

        match reader.read_normals() {
            Some(normals) => geometry.normals = normals.collect(),
            None => geometry.compute_vertex_normals(),
        }

        geometry.compute_bounding_volume();

        Ok(geometry)
    }

    /// Converts the document's node graph into flat prefab nodes. Meshes
    /// with multiple primitives become extra child nodes, keeping the
    /// one-mesh-per-node invariant.
    fn load_nodes(
        &self,
        document: &gltf::Document,
        mesh_primitives: &[Vec<Mesh>],
        prefab: &mut Prefab,
    ) {
        let node_count = document.nodes().count();
        prefab.nodes = vec![PrefabNode::new(); node_count];

        for gltf_node in document.nodes() {
            let idx = gltf_node.index();
            let mut node = PrefabNode::new();

            node.name = Some(
                gltf_node
                    .name()
                    .map_or_else(|| format!("Node_{idx}"), str::to_string),
            );

            let (translation, rotation, scale) = gltf_node.transform().decomposed();
            node.transform.position = Vec3::from_array(translation);
            node.transform.rotation = Quat::from_array(rotation);
            node.transform.scale = Vec3::from_array(scale);

            node.children_indices = gltf_node.children().map(|c| c.index()).collect();

            if let Some(gltf_mesh) = gltf_node.mesh() {
                let primitives = &mesh_primitives[gltf_mesh.index()];
                match primitives.len() {
                    0 => {}
                    1 => node.mesh = Some(primitives[0].clone()),
                    _ => {
                        for mesh in primitives {
                            let child_idx = prefab.nodes.len();
                            let mut child = PrefabNode::new();
                            child.name = Some(mesh.name.clone());
                            child.mesh = Some(mesh.clone());
                            prefab.nodes.push(child);
                            node.children_indices.push(child_idx);
                        }
                    }
                }
            }

            prefab.nodes[idx] = node;
        }

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next());
        if let Some(scene) = scene {
            prefab.root_indices = scene.nodes().map(|n| n.index()).collect();
        }
    }

    fn load_animations(
        &self,
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
        name: &str,
    ) -> Result<Vec<Arc<AnimationClip>>> {
        let mut animations = Vec::new();

        for anim in document.animations() {
            let mut tracks = Vec::new();

            for channel in anim.channels() {
                let reader = channel.reader(|buffer| Some(&*buffers[buffer.index()]));
                let target = channel.target();
                let gltf_node = target.node();

                // Node name used for bind-time resolution.
                let node_name = gltf_node
                    .name()
                    .map_or_else(|| format!("Node_{}", gltf_node.index()), str::to_string);

                let times: Vec<f32> = reader
                    .read_inputs()
                    .ok_or_else(|| {
                        ArdentError::GltfError(format!("Animation channel in '{name}' has no input"))
                    })?
                    .collect();

                let interpolation = match channel.sampler().interpolation() {
                    gltf::animation::Interpolation::Linear => InterpolationMode::Linear,
                    gltf::animation::Interpolation::Step => InterpolationMode::Step,
                    gltf::animation::Interpolation::CubicSpline => InterpolationMode::CubicSpline,
                };

                let outputs = reader.read_outputs().ok_or_else(|| {
                    ArdentError::GltfError(format!("Animation channel in '{name}' has no output"))
                })?;

                let track = match target.property() {
                    gltf::animation::Property::Translation => {
                        let values = match outputs {
                            gltf::animation::util::ReadOutputs::Translations(iter) => {
                                iter.map(Vec3::from_array).collect::<Vec<_>>()
                            }
                            _ => continue,
                        };

                        Track {
                            meta: TrackMeta {
                                node_name,
                                target: TargetPath::Translation,
                            },
                            data: TrackData::Vector3(KeyframeTrack::new(
                                times,
                                values,
                                interpolation,
                            )),
                        }
                    }
                    gltf::animation::Property::Rotation => {
                        let values = match outputs {
                            gltf::animation::util::ReadOutputs::Rotations(iter) => iter
                                .into_f32()
                                .map(Quat::from_array)
                                .collect::<Vec<_>>(),
                            _ => continue,
                        };

                        Track {
                            meta: TrackMeta {
                                node_name,
                                target: TargetPath::Rotation,
                            },
                            data: TrackData::Quaternion(KeyframeTrack::new(
                                times,
                                values,
                                interpolation,
                            )),
                        }
                    }
                    gltf::animation::Property::Scale => {
                        let values = match outputs {
                            gltf::animation::util::ReadOutputs::Scales(iter) => {
                                iter.map(Vec3::from_array).collect::<Vec<_>>()
                            }
                            _ => continue,
                        };

                        Track {
                            meta: TrackMeta {
                                node_name,
                                target: TargetPath::Scale,
                            },
                            data: TrackData::Vector3(KeyframeTrack::new(
                                times,
                                values,
                                interpolation,
                            )),
                        }
                    }
                    // Morph weights are not supported.
                    gltf::animation::Property::MorphTargetWeights => continue,
                };

                tracks.push(track);
            }

            let clip_name = anim
                .name()
                .map_or_else(|| format!("{name}_anim_{}", anim.index()), str::to_string);

            animations.push(Arc::new(AnimationClip::new(clip_name, tracks)));
        }

        Ok(animations)
    }
}
