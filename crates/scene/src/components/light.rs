use foundation::math::Vec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LightKind {
    Ambient,
    /// Shines from `position` towards the parent's origin.
    Directional { position: Vec3 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    /// 0xRRGGBB
    pub color: u32,
    pub intensity: f64,
}

impl Light {
    pub fn ambient(color: u32) -> Self {
        Self {
            kind: LightKind::Ambient,
            color,
            intensity: 1.0,
        }
    }

    pub fn directional(color: u32, intensity: f64, position: Vec3) -> Self {
        Self {
            kind: LightKind::Directional { position },
            color,
            intensity,
        }
    }
}
