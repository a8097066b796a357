use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    #[cfg(test)]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Raises the top face, e.g. to cover vegetation standing on a tile.
    pub fn extended_up(&self, height: f32) -> Self {
        Self {
            min: self.min,
            max: self.max + Vec3::Y * height.max(0.0),
        }
    }
}

/// Plane `normal · p + distance >= 0` on the inside.
#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: Vec3,
    distance: f32,
}

impl Plane {
    fn from_row(row: Vec4) -> Self {
        let normal = row.xyz();
        let length = normal.length();
        if length <= f32::EPSILON {
            return Self {
                normal: Vec3::ZERO,
                distance: row.w,
            };
        }
        Self {
            normal: normal / length,
            distance: row.w / length,
        }
    }

    fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the six clip planes from a view-projection matrix using
    /// wgpu's 0..1 depth range.
    pub fn from_view_projection(view_proj: Mat4) -> Self {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);

        Self {
            planes: [
                Plane::from_row(r3 + r0),
                Plane::from_row(r3 - r0),
                Plane::from_row(r3 + r1),
                Plane::from_row(r3 - r1),
                Plane::from_row(r2),
                Plane::from_row(r3 - r2),
            ],
        }
    }

    /// Conservative test: false only when the box is fully outside one plane.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let positive = Vec3::select(plane.normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            plane.signed_distance(positive) >= 0.0
        })
    }

    #[cfg(test)]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(point) >= 0.0)
    }
}

/// Per-frame visibility for a bounded group. Groups without bounds are
/// always drawn.
pub fn is_visible(frustum: &Frustum, bounds: Option<&Aabb>) -> bool {
    bounds.map_or(true, |b| frustum.intersects_aabb(b))
}

#[cfg(test)]
mod tests {
    use super::{is_visible, Aabb, Frustum};
    use glam::{Mat4, Vec3};

    fn camera_frustum() -> Frustum {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 5.0, 100.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(50f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0);
        Frustum::from_view_projection(proj * view)
    }

    #[test]
    fn huge_frustum_sees_the_origin_but_not_far_away() {
        let proj = Mat4::orthographic_rh(-1.0e4, 1.0e4, -1.0e4, 1.0e4, -1.0e4, 1.0e4);
        let frustum = Frustum::from_view_projection(proj);
        let bounds = Aabb::new(Vec3::splat(-10.0), Vec3::splat(10.0));

        assert!(frustum.intersects_aabb(&bounds));
        assert!(!frustum.intersects_aabb(&bounds.translated(Vec3::new(1.0e6, 0.0, 0.0))));
    }

    #[test]
    fn camera_sees_terrain_in_front_and_not_behind() {
        let frustum = camera_frustum();
        let ahead = Aabb::new(Vec3::new(-20.0, -1.0, -20.0), Vec3::new(20.0, 1.0, 20.0));
        assert!(frustum.intersects_aabb(&ahead));

        let behind = ahead.translated(Vec3::new(0.0, 0.0, 400.0));
        assert!(!frustum.intersects_aabb(&behind));

        let beyond_far = ahead.translated(Vec3::new(0.0, 0.0, -5000.0));
        assert!(!frustum.intersects_aabb(&beyond_far));
    }

    #[test]
    fn box_straddling_a_plane_counts_as_visible() {
        let frustum = camera_frustum();
        let wide = Aabb::new(Vec3::new(-5000.0, -1.0, 0.0), Vec3::new(5000.0, 1.0, 1.0));
        assert!(frustum.intersects_aabb(&wide));
    }

    #[test]
    fn unbounded_groups_are_always_visible() {
        assert!(is_visible(&camera_frustum(), None));
        assert!(camera_frustum().contains_point(Vec3::ZERO));
    }
}
