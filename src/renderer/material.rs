// renderer/material.rs

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        const ALPHA_BLEND = 1 << 0;
        const DOUBLE_SIDED = 1 << 1;
        const UNLIT = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Material {
    pub base_color: [u8; 4],
    pub flags: MaterialFlags,

    // Stored as u8, 0-255 -> 0.0-1.0
    pub metallic_factor: u8,
    pub roughness_factor: u8,
}

fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Material {
    pub fn new(color: [u8; 4]) -> Self {
        Self {
            base_color: color,
            flags: MaterialFlags::empty(),
            metallic_factor: 0,
            roughness_factor: 255,
        }
    }

    pub fn from_color_f32(color: [f32; 4]) -> Self {
        Self::new([
            to_u8(color[0]),
            to_u8(color[1]),
            to_u8(color[2]),
            to_u8(color[3]),
        ])
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new([r, g, b, 255])
    }

    pub fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub fn yellow() -> Self {
        Self::rgb(255, 255, 0)
    }

    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic_factor = to_u8(metallic);
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness_factor = to_u8(roughness);
        self
    }

    pub fn with_alpha(mut self) -> Self {
        self.flags |= MaterialFlags::ALPHA_BLEND;
        self
    }

    pub fn with_double_sided(mut self) -> Self {
        self.flags |= MaterialFlags::DOUBLE_SIDED;
        self
    }

    pub fn unlit(mut self) -> Self {
        self.flags |= MaterialFlags::UNLIT;
        self
    }

    /// Switches the material to alpha blending with the given opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.set_opacity(opacity);
        self
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.base_color[3] = to_u8(opacity);
        self.flags |= MaterialFlags::ALPHA_BLEND;
    }

    pub fn color_f32(&self) -> [f32; 4] {
        [
            self.base_color[0] as f32 / 255.0,
            self.base_color[1] as f32 / 255.0,
            self.base_color[2] as f32 / 255.0,
            self.base_color[3] as f32 / 255.0,
        ]
    }

    pub fn opacity(&self) -> f32 {
        self.base_color[3] as f32 / 255.0
    }

    pub fn metallic_f32(&self) -> f32 {
        self.metallic_factor as f32 / 255.0
    }

    pub fn roughness_f32(&self) -> f32 {
        self.roughness_factor as f32 / 255.0
    }

    pub fn is_transparent(&self) -> bool {
        self.flags.contains(MaterialFlags::ALPHA_BLEND)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::white()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_override_enables_blending() {
        let material = Material::white().with_opacity(0.3);
        assert!(material.is_transparent());
        assert!((material.opacity() - 0.3).abs() < 1.0 / 255.0);
        assert_eq!(&material.base_color[..3], &[255, 255, 255]);
    }

    #[test]
    fn float_colors_round_to_nearest_byte() {
        let material = Material::from_color_f32([0.5, 0.25, 0.75, 1.0]);
        assert_eq!(material.base_color, [128, 64, 191, 255]);
        assert!(!material.is_transparent());
    }

    #[test]
    fn factors_are_clamped() {
        let material = Material::white().with_metallic(2.0).with_roughness(-1.0);
        assert_eq!(material.metallic_factor, 255);
        assert_eq!(material.roughness_factor, 0);
    }
}
