use foundation::math::Vec3;

use crate::components::ComponentBounds;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Shape3D {
    /// Axis-aligned box of `size`, centered on `offset` in local space.
    Cuboid { size: Vec3, offset: Vec3 },
    Sphere { radius: f64 },
}

impl Shape3D {
    /// Local-space extent of the shape.
    pub fn bounds(&self) -> ComponentBounds {
        match *self {
            Shape3D::Cuboid { size, offset } => {
                let half = size * 0.5;
                ComponentBounds::new(offset - half, offset + half)
            }
            Shape3D::Sphere { radius } => {
                ComponentBounds::new(Vec3::splat(-radius), Vec3::splat(radius))
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Drawable3D {
    pub shape: Shape3D,
    /// 0xRRGGBB
    pub color: u32,
    pub highlight: bool,
}

impl Drawable3D {
    /// Box whose bottom face sits on the local origin, so z-scaling grows it upwards.
    pub fn column(footprint: f64, color: u32) -> Self {
        Self {
            shape: Shape3D::Cuboid {
                size: Vec3::new(footprint, footprint, 1.0),
                offset: Vec3::new(0.0, 0.0, 0.5),
            },
            color,
            highlight: false,
        }
    }

    pub fn sphere(radius: f64, color: u32) -> Self {
        Self {
            shape: Shape3D::Sphere { radius },
            color,
            highlight: false,
        }
    }
}
