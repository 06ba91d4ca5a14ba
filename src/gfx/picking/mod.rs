//! # Pointer Picking
//!
//! Turns a click on the window into a world-space point on the ground board.
//!
//! ## How it works
//!
//! 1. **Pointer to NDC**: pixel coordinates are mapped to [-1, 1] with the
//!    vertical axis flipped (pixel rows grow downward, world Y grows upward)
//! 2. **NDC to Ray**: the camera's inverse view-projection unprojects the
//!    point into a world-space ray starting at the eye
//! 3. **Ray vs. candidates**: a world AABB rejects misses early, then every
//!    triangle is tested and the nearest hit wins
//! 4. **Tag check**: the hit is only reported if the node carries the
//!    `interactable` tag
//!
//! A ray that hits nothing is an ordinary `None`, never an error.
//!
//! ## Usage
//!
//! ```no_run
//! use pawnview::gfx::picking::{pick, PickTarget};
//! # fn demo(scene: &pawnview::gfx::scene::Scene, board: usize) {
//! let camera = &scene.camera_manager.camera;
//! let targets: Vec<PickTarget> = PickTarget::from_scene(scene, board).into_iter().collect();
//! if let Some(hit) = pick(600.0, 400.0, 1200.0, 800.0, camera, &targets) {
//!     println!("clicked {:?}", hit.point);
//! }
//! # }
//! ```

use cgmath::{
    ElementWise, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, Vector4, Zero,
};

use crate::gfx::{
    camera::orbit_camera::OrbitCamera,
    scene::{NodeId, Scene, SceneNode},
};

/// Rejects near-parallel rays and self-hits at the origin
const EPSILON: f32 = 1e-6;

/// Pointer position in normalized device coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub ndc_x: f32,
    pub ndc_y: f32,
}

/// Maps viewport pixels to normalized device coordinates.
///
/// The viewport center maps to (0, 0), the top-left pixel corner to (-1, 1)
/// and the bottom-right corner to (1, -1).
pub fn normalize_pointer(screen_x: f32, screen_y: f32, width: f32, height: f32) -> PointerSample {
    let width = width.max(1.0);
    let height = height.max(1.0);

    PointerSample {
        ndc_x: (screen_x / width) * 2.0 - 1.0,
        ndc_y: -(screen_y / height) * 2.0 + 1.0,
    }
}

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Builds the ray from the camera eye through a pointer sample
    pub fn from_camera(sample: PointerSample, camera: &OrbitCamera) -> Self {
        let view_proj = camera.projection_matrix() * camera.view_matrix();
        let inv_view_proj = view_proj.invert().unwrap_or_else(Matrix4::identity);

        // OpenGL clip depth: near plane at -1, far plane at 1
        let near_3d = unproject(&inv_view_proj, sample, -1.0);
        let far_3d = unproject(&inv_view_proj, sample, 1.0);

        Ray::new(camera.eye, far_3d - near_3d)
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Möller–Trumbore ray/triangle test, double sided
    ///
    /// Returns the distance along the ray to the hit, if it lies in front of
    /// the origin.
    pub fn intersect_triangle(&self, triangle: [Vector3<f32>; 3]) -> Option<f32> {
        let [a, b, c] = triangle;
        let edge1 = b - a;
        let edge2 = c - a;

        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t > EPSILON).then_some(t)
    }
}

fn unproject(inv_view_proj: &Matrix4<f32>, sample: PointerSample, depth: f32) -> Vector3<f32> {
    let world = inv_view_proj * Vector4::new(sample.ndc_x, sample.ndc_y, depth, 1.0);
    world.truncate() / world.w
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vector3<f32>,
    /// Maximum corner of the bounding box
    pub max: Vector3<f32>,
}

impl AABB {
    /// Create a new AABB
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Create AABB from a set of vertices
    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        let Some(first) = vertices.first() else {
            return Self::new(Vector3::zero(), Vector3::zero());
        };

        let start = Vector3::from(*first);
        vertices.iter().skip(1).fold(Self::new(start, start), |aabb, vertex| {
            let v = Vector3::from(*vertex);
            Self::new(
                Vector3::new(aabb.min.x.min(v.x), aabb.min.y.min(v.y), aabb.min.z.min(v.z)),
                Vector3::new(aabb.max.x.max(v.x), aabb.max.y.max(v.y), aabb.max.z.max(v.z)),
            )
        })
    }

    /// Grows the box by `margin` on every side; keeps flat boxes hittable
    pub fn expanded(&self, margin: f32) -> Self {
        let pad = Vector3::new(margin, margin, margin);
        Self::new(self.min - pad, self.max + pad)
    }

    /// Test ray-AABB intersection
    /// Returns the distance to intersection point, or None if no intersection
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t1 = Vector3::new(
            t_min.x.min(t_max.x),
            t_min.y.min(t_max.y),
            t_min.z.min(t_max.z),
        );
        let t2 = Vector3::new(
            t_min.x.max(t_max.x),
            t_min.y.max(t_max.y),
            t_min.z.max(t_max.z),
        );

        let t_near = t1.x.max(t1.y.max(t1.z));
        let t_far = t2.x.min(t2.y.min(t2.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Apply a transformation matrix to the AABB
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        // Transform all 8 corners of the AABB and compute new bounds
        let corners = [
            [self.min.x, self.min.y, self.min.z],
            [self.max.x, self.min.y, self.min.z],
            [self.min.x, self.max.y, self.min.z],
            [self.min.x, self.min.y, self.max.z],
            [self.max.x, self.max.y, self.min.z],
            [self.max.x, self.min.y, self.max.z],
            [self.min.x, self.max.y, self.max.z],
            [self.max.x, self.max.y, self.max.z],
        ]
        .map(|corner| transform_point(matrix, corner).into());

        Self::from_vertices(&corners)
    }
}

fn transform_point(matrix: &Matrix4<f32>, point: [f32; 3]) -> Vector3<f32> {
    let transformed = matrix * Vector4::new(point[0], point[1], point[2], 1.0);
    transformed.truncate() / transformed.w
}

/// A node offered to the picker, with its world transform resolved
#[derive(Clone, Copy)]
pub struct PickTarget<'a> {
    pub id: NodeId,
    pub node: &'a SceneNode,
    pub world: Matrix4<f32>,
}

impl<'a> PickTarget<'a> {
    pub fn from_scene(scene: &'a Scene, id: NodeId) -> Option<Self> {
        scene.node(id).map(|node| Self {
            id,
            node,
            world: scene.world_transform(id),
        })
    }

    /// Distance to the nearest triangle hit, if any
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let mesh = self.node.mesh_ref()?;

        let local_positions: Vec<[f32; 3]> = mesh.vertices().iter().map(|v| v.position).collect();
        let bounds = AABB::from_vertices(&local_positions)
            .transform(&self.world)
            .expanded(1e-4);
        bounds.intersect_ray(ray)?;

        mesh.triangles()
            .filter_map(|corners| {
                let world_corners = corners.map(|corner| transform_point(&self.world, corner));
                ray.intersect_triangle(world_corners)
            })
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Result of a successful pick
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    /// Node that was hit
    pub node: NodeId,
    pub node_name: String,
    /// Pointer position that produced the ray
    pub pointer: PointerSample,
    /// World space intersection point
    pub point: Point3<f32>,
    /// Distance from camera to intersection point
    pub distance: f32,
}

/// Picks the nearest candidate under a screen point.
///
/// Returns `None` when the ray misses every candidate, when `candidates` is
/// empty, or when the nearest hit is not tagged `interactable`.
pub fn pick(
    screen_x: f32,
    screen_y: f32,
    viewport_width: f32,
    viewport_height: f32,
    camera: &OrbitCamera,
    candidates: &[PickTarget<'_>],
) -> Option<Intersection> {
    let pointer = normalize_pointer(screen_x, screen_y, viewport_width, viewport_height);
    let ray = Ray::from_camera(pointer, camera);

    let (target, distance) = candidates
        .iter()
        .filter_map(|target| target.intersect(&ray).map(|distance| (target, distance)))
        .min_by(|a, b| a.1.total_cmp(&b.1))?;

    if !target.node.is_interactable() {
        return None;
    }

    let point = ray.point_at(distance);
    Some(Intersection {
        node: target.id,
        node_name: target.node.name.clone(),
        pointer,
        point: Point3::new(point.x, point.y, point.z),
        distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        camera::{CameraController, CameraManager},
        geometry::generate_plane,
        scene::{Mesh, INTERACTABLE_TAG},
    };
    use cgmath::Deg;
    use rand::Rng;

    const WIDTH: f32 = 1200.0;
    const HEIGHT: f32 = 800.0;

    fn default_camera() -> OrbitCamera {
        OrbitCamera::looking_from(Vector3::new(0.0, 40.0, 40.0), Vector3::zero(), WIDTH / HEIGHT)
            .with_perspective(Deg(75.0), 0.1, 1000.0)
    }

    fn board(name: &str, height: f32) -> SceneNode {
        SceneNode::mesh(name, Mesh::from_geometry(&generate_plane(64.0, 64.0, 1, 1))).with_transform(
            Matrix4::from_translation(Vector3::new(0.0, height, 0.0)) * Matrix4::from_angle_x(Deg(-90.0)),
        )
    }

    fn scene_with(nodes: Vec<SceneNode>) -> Scene {
        let manager = CameraManager::new(default_camera(), CameraController::new(0.005, 0.1));
        let mut scene = Scene::new(manager);
        for node in nodes {
            scene.add_node(node);
        }
        scene
    }

    fn targets(scene: &Scene) -> Vec<PickTarget<'_>> {
        (0..scene.len())
            .filter_map(|id| PickTarget::from_scene(scene, id))
            .collect()
    }

    #[test]
    fn test_normalize_center_and_corners() {
        let center = normalize_pointer(WIDTH / 2.0, HEIGHT / 2.0, WIDTH, HEIGHT);
        assert_eq!(center, PointerSample { ndc_x: 0.0, ndc_y: 0.0 });

        let top_left = normalize_pointer(0.0, 0.0, WIDTH, HEIGHT);
        assert_eq!(top_left, PointerSample { ndc_x: -1.0, ndc_y: 1.0 });

        let bottom_right = normalize_pointer(WIDTH, HEIGHT, WIDTH, HEIGHT);
        assert_eq!(bottom_right, PointerSample { ndc_x: 1.0, ndc_y: -1.0 });

        let top_right = normalize_pointer(WIDTH, 0.0, WIDTH, HEIGHT);
        assert_eq!(top_right, PointerSample { ndc_x: 1.0, ndc_y: 1.0 });
    }

    #[test]
    fn test_normalize_random_points_stay_in_range() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let x = rng.random_range(0.0..WIDTH);
            let y = rng.random_range(0.0..HEIGHT);
            let sample = normalize_pointer(x, y, WIDTH, HEIGHT);

            assert!((-1.0..=1.0).contains(&sample.ndc_x));
            assert!((-1.0..=1.0).contains(&sample.ndc_y));
            // Lower pixel rows map to higher NDC
            assert_eq!(sample.ndc_y > 0.0, y < HEIGHT / 2.0);
        }
    }

    #[test]
    fn test_center_click_hits_origin() {
        let scene = scene_with(vec![board(INTERACTABLE_TAG, 0.0)]);
        let hit = pick(WIDTH / 2.0, HEIGHT / 2.0, WIDTH, HEIGHT, &scene.camera_manager.camera, &targets(&scene))
            .expect("center ray should hit the board");

        assert!(hit.point.x.abs() < 1e-3);
        assert!(hit.point.y.abs() < 1e-3);
        assert!(hit.point.z.abs() < 1e-3);
        assert_eq!(hit.node_name, INTERACTABLE_TAG);
        assert!((hit.distance - 40.0 * 2f32.sqrt()).abs() < 1e-2);
    }

    #[test]
    fn test_hit_lies_on_plane_elevation() {
        let scene = scene_with(vec![board(INTERACTABLE_TAG, 0.0)]);
        let hit = pick(250.0, 620.0, WIDTH, HEIGHT, &scene.camera_manager.camera, &targets(&scene))
            .expect("ray should land on the board");

        assert!(hit.point.y.abs() < 1e-3);
        assert!(hit.point.x < 0.0, "left half of the screen maps to -X");
        assert!(hit.point.z > 0.0, "lower half of the screen is nearer the camera");
    }

    #[test]
    fn test_click_beyond_board_returns_none() {
        let scene = scene_with(vec![board(INTERACTABLE_TAG, 0.0)]);
        // The top edge looks just below the horizon, far past the 64x64 board
        assert!(pick(WIDTH / 2.0, 0.0, WIDTH, HEIGHT, &scene.camera_manager.camera, &targets(&scene)).is_none());
    }

    #[test]
    fn test_empty_candidates_returns_none() {
        let camera = default_camera();
        assert!(pick(WIDTH / 2.0, HEIGHT / 2.0, WIDTH, HEIGHT, &camera, &[]).is_none());
    }

    #[test]
    fn test_untagged_node_is_not_reported() {
        let scene = scene_with(vec![board("decoration", 0.0)]);
        let candidates = targets(&scene);
        let ray = Ray::from_camera(PointerSample { ndc_x: 0.0, ndc_y: 0.0 }, &scene.camera_manager.camera);

        assert!(candidates[0].intersect(&ray).is_some());
        assert!(pick(WIDTH / 2.0, HEIGHT / 2.0, WIDTH, HEIGHT, &scene.camera_manager.camera, &candidates).is_none());
    }

    #[test]
    fn test_nearest_hit_decides_tag() {
        // An untagged board floating above the tagged one blocks it
        let blocked = scene_with(vec![board(INTERACTABLE_TAG, 0.0), board("overlay", 5.0)]);
        assert!(pick(WIDTH / 2.0, HEIGHT / 2.0, WIDTH, HEIGHT, &blocked.camera_manager.camera, &targets(&blocked)).is_none());

        let clear = scene_with(vec![board("underlay", -5.0), board(INTERACTABLE_TAG, 0.0)]);
        let hit = pick(WIDTH / 2.0, HEIGHT / 2.0, WIDTH, HEIGHT, &clear.camera_manager.camera, &targets(&clear))
            .expect("tagged board is nearest");
        assert_eq!(hit.node, 1);
    }

    #[test]
    fn test_hit_reprojects_after_orbit_and_pan() {
        let (width, height) = (1280.0, 720.0);
        let mut scene = scene_with(vec![board(INTERACTABLE_TAG, 0.0)]);
        let camera = &mut scene.camera_manager.camera;
        camera.resize_projection(width as u32, height as u32);
        camera.add_yaw(0.7);
        camera.add_pitch(-0.2);
        camera.pan((0.3, -0.2));

        let (x, y) = (700.0, 420.0);
        let camera = &scene.camera_manager.camera;
        let hit = pick(x, y, width, height, camera, &targets(&scene)).expect("ray should land on the board");
        assert!(hit.point.y.abs() < 1e-3);

        let clip = camera.projection_matrix() * camera.view_matrix() * hit.point.to_homogeneous();
        let expected = normalize_pointer(x, y, width, height);
        assert!((clip.x / clip.w - expected.ndc_x).abs() < 1e-3);
        assert!((clip.y / clip.w - expected.ndc_y).abs() < 1e-3);
    }

    #[test]
    fn test_non_mesh_targets_are_skipped() {
        let scene = scene_with(vec![SceneNode::group(INTERACTABLE_TAG)]);
        assert!(pick(WIDTH / 2.0, HEIGHT / 2.0, WIDTH, HEIGHT, &scene.camera_manager.camera, &targets(&scene)).is_none());
    }

    #[test]
    fn test_aabb_creation() {
        let vertices = vec![
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            [-1.0, -1.0, -1.0],
        ];
        let aabb = AABB::from_vertices(&vertices);

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_ray_aabb_intersection() {
        let aabb = AABB::new(
            Vector3::new(-1.0, -1.0, -1.0),
            Vector3::new(1.0, 1.0, 1.0),
        );

        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(aabb.intersect_ray(&ray), Some(4.0));

        let ray_miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_miss).is_none());
    }

    #[test]
    fn test_triangle_behind_ray_is_ignored() {
        let triangle = [
            Vector3::new(-1.0, -1.0, 0.0),
            Vector3::new(1.0, -1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        let toward = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        let away = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));

        assert_eq!(toward.intersect_triangle(triangle), Some(5.0));
        assert!(away.intersect_triangle(triangle).is_none());
    }
}
