//! Decorative "secure core" scene: three nested icosahedral layers spinning on their own.
//!
//! The renderer only produces projected 2D primitives; the UI surface paints
//! them once per display refresh. Nothing here can fail in a way the page
//! cares about, so there is no error type.

use std::collections::HashSet;

use tracing::debug;

pub const CAMERA_FOV_DEG: f32 = 75.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
pub const CAMERA_Z: f32 = 4.5;
pub const FOG_COLOR: u32 = 0x0a0a0a;
pub const FOG_DENSITY: f32 = 0.035;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    fn add(self, other: Vec3) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    fn normalized(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            self
        } else {
            self.scale(1.0 / len)
        }
    }

    /// Euler rotation in X, then Y, then Z order of the rotation matrix (`Rx * Ry * Rz * v`).
    pub fn rotated(self, euler: Vec3) -> Self {
        let (sz, cz) = euler.z.sin_cos();
        let v = Vec3::new(self.x * cz - self.y * sz, self.x * sz + self.y * cz, self.z);
        let (sy, cy) = euler.y.sin_cos();
        let v = Vec3::new(v.x * cy + v.z * sy, v.y, -v.x * sy + v.z * cy);
        let (sx, cx) = euler.x.sin_cos();
        Vec3::new(v.x, v.y * cx - v.z * sx, v.y * sx + v.z * cx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerStyle {
    Wireframe,
    /// World-space point size, attenuated by depth.
    Points { size: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: &'static str,
    pub vertices: Vec<Vec3>,
    pub edges: Vec<(usize, usize)>,
    pub style: LayerStyle,
    pub color: u32,
    pub opacity: f32,
    pub rotation: Vec3,
    /// Rotation added every frame, radians.
    pub spin: Vec3,
}

impl Layer {
    fn advance(&mut self) {
        self.rotation = self.rotation.add(self.spin);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(self) -> f32 {
        self.width / self.height.max(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    pub z: f32,
    pub viewport: Viewport,
}

impl Camera {
    fn focal(&self) -> f32 {
        1.0 / (self.fov_deg.to_radians() / 2.0).tan()
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.aspect()
    }

    /// Screen position in pixels plus view depth, or None outside the clip range.
    pub fn project(&self, point: Vec3) -> Option<([f32; 2], f32)> {
        let depth = self.z - point.z;
        if depth < self.near || depth > self.far {
            return None;
        }
        let f = self.focal();
        let ndc_x = (f / self.aspect()) * point.x / depth;
        let ndc_y = f * point.y / depth;
        let sx = (ndc_x + 1.0) * 0.5 * self.viewport.width;
        let sy = (1.0 - ndc_y) * 0.5 * self.viewport.height;
        Some(([sx, sy], depth))
    }
}

/// Exponential-squared fog: 1.0 at the eye, falling toward 0.0 with depth.
pub fn fog_visibility(depth: f32) -> f32 {
    let d = FOG_DENSITY * depth;
    (-(d * d)).exp()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedSegment {
    pub from: [f32; 2],
    pub to: [f32; 2],
    pub color: u32,
    pub alpha: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub at: [f32; 2],
    pub radius: f32,
    pub color: u32,
    pub alpha: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedFrame {
    pub segments: Vec<ProjectedSegment>,
    pub points: Vec<ProjectedPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoreScene {
    pub camera: Camera,
    pub layers: Vec<Layer>,
}

impl CoreScene {
    pub fn new(viewport: Viewport) -> Self {
        let (nucleus_vertices, nucleus_edges) = icosphere(0.8, 2);
        let (shield_vertices, shield_edges) = icosphere(1.4, 1);
        let (shell_vertices, _) = icosphere(2.2, 1);

        Self {
            camera: Camera {
                fov_deg: CAMERA_FOV_DEG,
                near: CAMERA_NEAR,
                far: CAMERA_FAR,
                z: CAMERA_Z,
                viewport,
            },
            layers: vec![
                Layer {
                    name: "nucleus",
                    vertices: nucleus_vertices,
                    edges: nucleus_edges,
                    style: LayerStyle::Wireframe,
                    color: 0x00ff9d,
                    opacity: 0.3,
                    rotation: Vec3::default(),
                    spin: Vec3::new(0.0, -0.005, 0.002),
                },
                Layer {
                    name: "shield",
                    vertices: shield_vertices,
                    edges: shield_edges,
                    style: LayerStyle::Wireframe,
                    color: 0x00cc7a,
                    opacity: 1.0,
                    rotation: Vec3::default(),
                    spin: Vec3::new(-0.001, 0.003, 0.0),
                },
                Layer {
                    name: "shell",
                    vertices: shell_vertices,
                    edges: Vec::new(),
                    style: LayerStyle::Points { size: 0.05 },
                    color: 0xffffff,
                    opacity: 0.6,
                    rotation: Vec3::default(),
                    spin: Vec3::new(0.0, -0.001, 0.0),
                },
            ],
        }
    }

    pub fn advance(&mut self) {
        for layer in &mut self.layers {
            layer.advance();
        }
    }

    pub fn project(&self) -> ProjectedFrame {
        let mut frame = ProjectedFrame::default();
        let half_height = self.camera.viewport.height * 0.5;

        for layer in &self.layers {
            let projected: Vec<_> = layer
                .vertices
                .iter()
                .map(|v| self.camera.project(v.rotated(layer.rotation)))
                .collect();

            match layer.style {
                LayerStyle::Wireframe => {
                    for &(a, b) in &layer.edges {
                        let (Some((from, da)), Some((to, db))) = (projected[a], projected[b])
                        else {
                            continue;
                        };
                        frame.segments.push(ProjectedSegment {
                            from,
                            to,
                            color: layer.color,
                            alpha: layer.opacity * fog_visibility((da + db) * 0.5),
                        });
                    }
                }
                LayerStyle::Points { size } => {
                    for (at, depth) in projected.into_iter().flatten() {
                        frame.points.push(ProjectedPoint {
                            at,
                            radius: (size * half_height / depth * 0.5).max(0.5),
                            color: layer.color,
                            alpha: layer.opacity * fog_visibility(depth),
                        });
                    }
                }
            }
        }
        frame
    }
}

/// Start/stop lifecycle around the decorative loop. Stopped renderers draw nothing.
#[derive(Debug, Default)]
pub struct SceneRenderer {
    scene: Option<CoreScene>,
    frames: u64,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// No-op when the container is absent or the loop is already running.
    pub fn start(&mut self, container: Option<Viewport>) -> bool {
        if self.scene.is_some() {
            return true;
        }
        let Some(viewport) = container else {
            debug!("scene: no container, renderer stays idle");
            return false;
        };
        self.scene = Some(CoreScene::new(viewport));
        debug!(width = viewport.width, height = viewport.height, "scene: render loop started");
        true
    }

    pub fn is_running(&self) -> bool {
        self.scene.is_some()
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if let Some(scene) = &mut self.scene {
            if scene.camera.viewport != viewport {
                scene.camera.viewport = viewport;
            }
        }
    }

    /// One display refresh: spin every layer one step and project.
    pub fn frame(&mut self) -> Option<ProjectedFrame> {
        let scene = self.scene.as_mut()?;
        scene.advance();
        self.frames += 1;
        Some(scene.project())
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn scene(&self) -> Option<&CoreScene> {
        self.scene.as_ref()
    }

    pub fn stop(&mut self) {
        if self.scene.take().is_some() {
            debug!(frames = self.frames, "scene: render loop stopped");
        }
    }
}

const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

fn icosahedron_vertices() -> [Vec3; 12] {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
}

/// Icosahedron with every face split into `(detail + 1)^2` triangles, pushed out to `radius`.
///
/// Returns deduplicated vertices and the unique triangle edges between them.
pub fn icosphere(radius: f32, detail: usize) -> (Vec<Vec3>, Vec<(usize, usize)>) {
    let base = icosahedron_vertices();
    let n = detail + 1;
    let mut vertices: Vec<Vec3> = Vec::new();
    let mut edges = Vec::new();
    let mut seen_edges = HashSet::new();

    // Shared face borders are computed from different corners, so match with a tolerance.
    let intern = |p: Vec3, vertices: &mut Vec<Vec3>| -> usize {
        let p = p.normalized().scale(radius);
        let tolerance = radius * 1e-4;
        if let Some(idx) = vertices.iter().position(|v| {
            (v.x - p.x).abs() < tolerance
                && (v.y - p.y).abs() < tolerance
                && (v.z - p.z).abs() < tolerance
        }) {
            return idx;
        }
        vertices.push(p);
        vertices.len() - 1
    };

    for [ia, ib, ic] in ICOSAHEDRON_FACES {
        let (a, b, c) = (base[ia], base[ib], base[ic]);
        let at = |i: usize, j: usize| {
            let wb = j as f32 / n as f32;
            let wc = i as f32 / n as f32;
            a.scale(1.0 - wb - wc).add(b.scale(wb)).add(c.scale(wc))
        };

        let mut grid = vec![vec![0usize; n + 1]; n + 1];
        for i in 0..=n {
            for j in 0..=(n - i) {
                grid[i][j] = intern(at(i, j), &mut vertices);
            }
        }

        let mut add_triangle = |p: usize, q: usize, r: usize| {
            for (u, v) in [(p, q), (q, r), (r, p)] {
                let edge = (u.min(v), u.max(v));
                if seen_edges.insert(edge) {
                    edges.push(edge);
                }
            }
        };
        for i in 0..n {
            for j in 0..(n - i) {
                add_triangle(grid[i][j], grid[i][j + 1], grid[i + 1][j]);
                if i + j + 1 < n {
                    add_triangle(grid[i + 1][j], grid[i][j + 1], grid[i + 1][j + 1]);
                }
            }
        }
    }

    (vertices, edges)
}

#[cfg(test)]
#[path = "tests/scene_tests.rs"]
mod tests;
