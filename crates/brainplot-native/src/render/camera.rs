//! Camera placement and projection
//!
//! Views are described the way the plots have always been framed: an
//! azimuth in the XY plane measured from +X, an elevation measured down from
//! +Z, and a distance from the focal point. The view-up vector is +Z.

use crate::math::{add, cross, dot, length, normalize, scale, sub, Vec3};

/// Base azimuth; a rotation of 0 looks at the scene from +Y
pub const BASE_AZIMUTH_DEG: f32 = 90.0;

/// Distance of the default view from the origin, in mesh units
pub const BASE_DISTANCE: f32 = 450.0;

/// Vertical field of view in degrees
pub const DEFAULT_FOV_DEG: f32 = 30.0;

/// Spherical camera placement around a focal point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewAngles {
    /// Angle in the XY plane from +X, degrees
    pub azimuth_deg: f32,
    /// Angle from +Z, degrees (90 = horizontal)
    pub elevation_deg: f32,
    /// Camera distance from the focal point
    pub distance: f32,
    /// Point the camera looks at
    pub focal_point: Vec3,
}

impl ViewAngles {
    /// View for interactive display, offset from the default framing.
    ///
    /// `rotation` turns the camera about +Z, `elevation` raises it above
    /// the horizon, `distance` moves it away from the default distance.
    #[must_use]
    pub fn interactive(rotation: f32, elevation: f32, distance: f32) -> Self {
        Self {
            azimuth_deg: BASE_AZIMUTH_DEG + rotation,
            elevation_deg: 90.0 - elevation,
            distance: BASE_DISTANCE + distance,
            focal_point: [0.0; 3],
        }
    }

    /// Camera position in world space
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        let az = self.azimuth_deg.to_radians();
        let el = self.elevation_deg.to_radians();
        add(
            self.focal_point,
            [
                self.distance * el.sin() * az.cos(),
                self.distance * el.sin() * az.sin(),
                self.distance * el.cos(),
            ],
        )
    }

    /// Turn the view by the given angles, keeping the elevation off the poles
    pub fn orbit(&mut self, delta_azimuth_deg: f32, delta_elevation_deg: f32) {
        self.azimuth_deg = (self.azimuth_deg + delta_azimuth_deg).rem_euclid(360.0);
        self.elevation_deg = (self.elevation_deg + delta_elevation_deg).clamp(1.0, 179.0);
    }

    /// Scale the distance (dolly)
    pub fn zoom(&mut self, factor: f32) {
        self.distance = (self.distance * factor.clamp(0.1, 10.0)).max(1.0);
    }
}

impl Default for ViewAngles {
    fn default() -> Self {
        Self::interactive(0.0, 0.0, 0.0)
    }
}

/// A projected point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    /// Pixel column
    pub x: f32,
    /// Pixel row (down)
    pub y: f32,
    /// Distance along the view direction
    pub depth: f32,
}

/// Perspective camera
#[derive(Clone, Debug)]
pub struct Camera3D {
    /// Eye position
    pub position: Vec3,
    /// Look-at target
    pub target: Vec3,
    /// Up vector
    pub up: Vec3,
    /// Field of view (radians)
    pub fov: f32,
    /// Near clip plane
    pub near: f32,
    /// Viewport width in pixels
    pub width: f32,
    /// Viewport height in pixels
    pub height: f32,
    right: Vec3,
    true_up: Vec3,
    forward: Vec3,
    focal: f32,
}

impl Camera3D {
    /// Camera for a view and viewport
    #[must_use]
    pub fn from_view(view: &ViewAngles, width: u32, height: u32) -> Self {
        let position = view.eye();
        let target = view.focal_point;
        let forward = normalize(sub(target, position));
        // Looking straight along Z leaves +Z useless as an up hint.
        let up = if length(cross(forward, [0.0, 0.0, 1.0])) < 1e-4 {
            [0.0, 1.0, 0.0]
        } else {
            [0.0, 0.0, 1.0]
        };
        Self::look_at(position, target, up, width, height)
    }

    /// Camera at `position` looking at `target`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3, width: u32, height: u32) -> Self {
        let forward = normalize(sub(target, position));
        let right = normalize(cross(forward, up));
        let true_up = cross(right, forward);
        let fov = DEFAULT_FOV_DEG.to_radians();
        let height_px = height.max(1) as f32;
        Self {
            position,
            target,
            up,
            fov,
            near: 0.1,
            width: width.max(1) as f32,
            height: height_px,
            right,
            true_up,
            forward,
            focal: (height_px / 2.0) / (fov / 2.0).tan(),
        }
    }

    /// Unit vector from the eye toward the target
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Distance of `p` in front of the camera along the view direction
    #[must_use]
    pub fn view_depth(&self, p: Vec3) -> f32 {
        dot(sub(p, self.position), self.forward)
    }

    /// Project a world point to pixel coordinates; `None` behind the near
    /// plane
    #[must_use]
    pub fn project(&self, p: Vec3) -> Option<ScreenPoint> {
        let rel = sub(p, self.position);
        let depth = dot(rel, self.forward);
        if depth < self.near {
            return None;
        }
        let x = dot(rel, self.right);
        let y = dot(rel, self.true_up);
        Some(ScreenPoint {
            x: self.width / 2.0 + x * self.focal / depth,
            y: self.height / 2.0 - y * self.focal / depth,
            depth,
        })
    }

    /// Projected radius in pixels of a sphere at `depth`
    #[must_use]
    pub fn pixel_radius(&self, radius: f32, depth: f32) -> f32 {
        radius * self.focal / depth.max(self.near)
    }

    /// Direction from `p` toward the eye
    #[must_use]
    pub fn to_eye(&self, p: Vec3) -> Vec3 {
        normalize(sub(self.position, p))
    }

    /// World direction in view space: +X right, +Y up, +Z toward the eye
    #[must_use]
    pub fn view_normal(&self, n: Vec3) -> Vec3 {
        [
            dot(n, self.right),
            dot(n, self.true_up),
            -dot(n, self.forward),
        ]
    }

    /// Point offset from `p` along screen right/up by world units
    #[must_use]
    pub fn offset_on_screen(&self, p: Vec3, right: f32, up: f32) -> Vec3 {
        add(p, add(scale(self.right, right), scale(self.true_up, up)))
    }
}
