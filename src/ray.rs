//! Cursor ray casting against the tracked meshes.
//!
//! The ray is built by unprojecting the pointer's normalized device
//! coordinates through the primary camera, then tested CPU-side against the
//! world-space triangles of every tracked mesh. The consumer needs the
//! world-space intersection point (the shadow rig aims at it), which is why
//! this is not a GPU pick pass.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector2, Vector3, Vector4};

use crate::{
    camera::{Camera, Projection},
    data_structures::scene_graph::{NodeId, NodeKind, Scene},
};

const EPSILON: f32 = 1e-7;

#[derive(Clone, Debug)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Build a world-space ray from the camera through normalized device
    /// coordinates. A non-invertible view-projection degrades to the camera
    /// forward direction rather than failing the frame.
    pub fn from_camera(camera: &Camera, projection: &Projection, ndc: Vector2<f32>) -> Self {
        let view_proj = projection.calc_matrix() * camera.calc_matrix();
        let direction = match view_proj.invert() {
            Some(inverse) => {
                let near = inverse * Vector4::new(ndc.x, ndc.y, 0.0, 1.0);
                let far = inverse * Vector4::new(ndc.x, ndc.y, 1.0, 1.0);
                if near.w.abs() > EPSILON && far.w.abs() > EPSILON {
                    (far.truncate() / far.w - near.truncate() / near.w).normalize()
                } else {
                    camera.forward()
                }
            }
            None => camera.forward(),
        };
        Self {
            origin: camera.position,
            direction,
        }
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }

    /// Möller-Trumbore intersection. Returns the distance along the ray,
    /// front and back faces alike.
    pub fn intersect_triangle(
        &self,
        v0: Vector3<f32>,
        v1: Vector3<f32>,
        v2: Vector3<f32>,
    ) -> Option<f32> {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let h = self.direction.cross(edge2);
        let det = edge1.dot(h);
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin.to_vec() - v0;
        let u = inv_det * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = inv_det * self.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = inv_det * edge2.dot(q);
        (t > EPSILON).then_some(t)
    }
}

/// A single ray/mesh hit.
#[derive(Clone, Debug)]
pub struct Intersection {
    pub node: NodeId,
    pub point: Point3<f32>,
    pub t: f32,
}

/// Intersect the ray against every triangle of every tracked mesh, in world
/// space. Returns all hits, unordered.
pub fn intersect_tracked(ray: &Ray, scene: &Scene, tracked: &[NodeId]) -> Vec<Intersection> {
    let mut hits = Vec::new();
    for &id in tracked {
        let node = scene.node(id);
        if let NodeKind::Mesh(mesh_node) = &node.kind {
            let world = node.world.to_matrix();
            for mesh in &mesh_node.meshes {
                for [a, b, c] in mesh.geometry.triangles() {
                    let a = transform_point(&world, a);
                    let b = transform_point(&world, b);
                    let c = transform_point(&world, c);
                    if let Some(t) = ray.intersect_triangle(a, b, c) {
                        hits.push(Intersection {
                            node: id,
                            point: ray.at(t),
                            t,
                        });
                    }
                }
            }
        }
    }
    hits
}

/// Select the hit whose point is *farthest* from `eye`: all hits are sorted
/// by descending eye distance and the first is taken. Nearest-hit would be
/// the conventional choice; see DESIGN.md before changing the ordering.
pub fn farthest_from(mut hits: Vec<Intersection>, eye: Point3<f32>) -> Option<Intersection> {
    hits.sort_by(|a, b| {
        let da = (a.point - eye).magnitude();
        let db = (b.point - eye).magnitude();
        db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.into_iter().next()
}

fn transform_point(matrix: &Matrix4<f32>, point: Vector3<f32>) -> Vector3<f32> {
    (matrix * point.extend(1.0)).truncate()
}
