//! Visual layer seam.
//!
//! The core never renders. Each pool instance asks a [`VisualFactory`] for one
//! [`VisualGroup`] holding `num_particles` handles that share a [`VisualStyle`];
//! adapters (scene graphs, GPU instancing, tests) implement both traits.

use serde::{Deserialize, Serialize};

use crate::config::{Blending, PlayerConfig, Shader};
use crate::data::{FrameDataStore, Transform};
use crate::error::PlayerError;

/// Edge length of an unscaled particle quad, in scene units.
pub const BASE_QUAD_SIZE: f32 = 0.1;

/// Material/geometry description resolved once per configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VisualStyle {
    pub shader: Shader,
    pub blending: Blending,
    /// sRGB in 0..1, as written in the hex colour; not linearized.
    pub color: [f32; 3],
    pub opacity: f32,
    pub texture: Option<String>,
    pub transparent: bool,
    /// Quad width/height.
    pub size: [f32; 2],
    /// Fixed quad orientation (Euler radians) applied to the shared geometry.
    pub orientation: [f32; 3],
}

impl VisualStyle {
    pub fn resolve(cfg: &PlayerConfig, store: &FrameDataStore) -> Result<Self, PlayerError> {
        let color = parse_hex_color(&cfg.color)?;
        let aspect = cfg.image.as_ref().map_or(1.0, |img| img.aspect());
        let orientation = store
            .sprite_rotation()
            .unwrap_or_else(|| cfg.protation.map(f32::to_radians));
        Ok(Self {
            shader: cfg.shader,
            blending: cfg.blending,
            color,
            opacity: cfg.opacity,
            texture: cfg.image.as_ref().map(|img| img.src.clone()),
            transparent: cfg.image.is_some()
                || cfg.blending != Blending::Normal
                || cfg.opacity < 1.0,
            size: [
                BASE_QUAD_SIZE * aspect * cfg.pscale,
                BASE_QUAD_SIZE * cfg.pscale,
            ],
            orientation,
        })
    }
}

/// `#rgb` / `#rrggbb` to 0..1 sRGB channels (byte / 255).
fn parse_hex_color(s: &str) -> Result<[f32; 3], PlayerError> {
    let bad = || PlayerError::invalid_config(format!("invalid color '{s}'"));
    let hex = s.trim().strip_prefix('#').ok_or_else(bad)?;
    if !hex.is_ascii() {
        return Err(bad());
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| bad());
    let [r, g, b] = match hex.len() {
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = channel(&c.to_string())?;
                out[i] = v * 17;
            }
            out
        }
        6 => [
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        ],
        _ => return Err(bad()),
    };
    Ok([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0])
}

/// One instance's group of particle handles, parented under a shared group transform.
pub trait VisualGroup {
    fn set_visible(&mut self, visible: bool);
    fn set_transform(&mut self, transform: &Transform);
    fn set_particle_visible(&mut self, index: usize, visible: bool);
    fn set_particle_position(&mut self, index: usize, position: [f32; 3]);
    fn set_particle_rotation(&mut self, index: usize, rotation: [f32; 3]);
}

/// Creates (and releases) visual groups for pool instances.
pub trait VisualFactory {
    type Group: VisualGroup;

    fn create_group(&mut self, num_particles: usize, style: &VisualStyle) -> Self::Group;

    /// Called for every group of a pool being discarded.
    fn release_group(&mut self, group: Self::Group) {
        drop(group);
    }
}

/// Last written state of one particle handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RetainedParticle {
    pub visible: bool,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
}

/// Headless visual group that records what the engine wrote.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RetainedGroup {
    pub visible: bool,
    pub transform: Transform,
    pub particles: Vec<RetainedParticle>,
}

impl RetainedGroup {
    pub fn new(num_particles: usize) -> Self {
        Self {
            visible: false,
            transform: Transform::IDENTITY,
            particles: vec![RetainedParticle::default(); num_particles],
        }
    }

    /// Indices of handles that are currently visible (ignores group visibility).
    pub fn visible_particles(&self) -> Vec<usize> {
        self.particles
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.visible.then_some(i))
            .collect()
    }
}

impl VisualGroup for RetainedGroup {
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn set_transform(&mut self, transform: &Transform) {
        self.transform = *transform;
    }

    fn set_particle_visible(&mut self, index: usize, visible: bool) {
        if let Some(p) = self.particles.get_mut(index) {
            p.visible = visible;
        }
    }

    fn set_particle_position(&mut self, index: usize, position: [f32; 3]) {
        if let Some(p) = self.particles.get_mut(index) {
            p.position = position;
        }
    }

    fn set_particle_rotation(&mut self, index: usize, rotation: [f32; 3]) {
        if let Some(p) = self.particles.get_mut(index) {
            p.rotation = rotation;
        }
    }
}

/// Factory for [`RetainedGroup`]s; counts creations and releases.
#[derive(Clone, Debug, Default)]
pub struct RetainedFactory {
    pub created: usize,
    pub released: usize,
    pub last_style: Option<VisualStyle>,
}

impl VisualFactory for RetainedFactory {
    type Group = RetainedGroup;

    fn create_group(&mut self, num_particles: usize, style: &VisualStyle) -> RetainedGroup {
        self.created += 1;
        self.last_style = Some(style.clone());
        RetainedGroup::new(num_particles)
    }

    fn release_group(&mut self, _group: RetainedGroup) {
        self.released += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageInfo;

    fn store_with(sprite_rotation: &str) -> FrameDataStore {
        FrameDataStore::from_json(
            &format!(r#"{{"frames":[[[0,0,0]]],"precision":100,"sprite_rotation":{sprite_rotation}}}"#),
            1.0,
        )
        .expect("store")
    }

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#fff").unwrap(), [1.0, 1.0, 1.0]);
        assert_eq!(parse_hex_color("#ff0000").unwrap(), [1.0, 0.0, 0.0]);
        assert!(parse_hex_color("red").is_err());
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#zzz").is_err());
    }

    #[test]
    fn hex_channels_stay_in_srgb() {
        // mid grey keeps its encoded value; a linearized 0x80 would be ~0.216
        let [r, g, b] = parse_hex_color("#808080").unwrap();
        approx(r, 128.0 / 255.0, 1e-6);
        approx(g, 128.0 / 255.0, 1e-6);
        approx(b, 128.0 / 255.0, 1e-6);
    }

    #[test]
    fn default_style_is_additive_and_transparent() {
        let style = VisualStyle::resolve(&PlayerConfig::default(), &store_with("false")).unwrap();
        assert_eq!(style.blending, Blending::Additive);
        assert!(style.transparent);
        assert_eq!(style.size, [BASE_QUAD_SIZE, BASE_QUAD_SIZE]);
        assert_eq!(style.orientation, [0.0; 3]);
    }

    #[test]
    fn normal_blending_without_image_is_opaque() {
        let cfg = PlayerConfig {
            blending: Blending::Normal,
            ..Default::default()
        };
        let style = VisualStyle::resolve(&cfg, &store_with("false")).unwrap();
        assert!(!style.transparent);
    }

    #[test]
    fn image_aspect_and_pscale_shape_the_quad() {
        let cfg = PlayerConfig {
            pscale: 2.0,
            image: Some(ImageInfo {
                src: "spark.png".into(),
                width: 64,
                height: 32,
            }),
            ..Default::default()
        };
        let style = VisualStyle::resolve(&cfg, &store_with("false")).unwrap();
        approx(style.size[0], 0.4, 1e-6);
        approx(style.size[1], 0.2, 1e-6);
        assert_eq!(style.texture.as_deref(), Some("spark.png"));
    }

    #[test]
    fn sprite_rotation_overrides_protation() {
        let cfg = PlayerConfig {
            protation: [90.0, 0.0, 0.0],
            ..Default::default()
        };
        let from_cfg = VisualStyle::resolve(&cfg, &store_with("false")).unwrap();
        approx(from_cfg.orientation[0], std::f32::consts::FRAC_PI_2, 1e-6);

        let from_data = VisualStyle::resolve(&cfg, &store_with("[0,157,0]")).unwrap();
        approx(from_data.orientation[0], 0.0, 1e-6);
        approx(from_data.orientation[1], 1.57, 1e-6);
    }
}
