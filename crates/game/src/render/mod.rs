//! Glue between the simulation's draw intents and the GPU renderer.

use renderer::{FrameSettings, PointInstance, RenderError};
use simulation::{DrawList, FrameStyle};

/// Convert draw intents into GPU instances, reusing `out`'s allocation.
pub fn build_instances(list: &DrawList, out: &mut Vec<PointInstance>) {
    out.clear();
    out.extend(
        list.points
            .iter()
            .map(|p| PointInstance::new(p.position.to_array(), p.size, p.color.to_array())),
    );
}

pub fn frame_settings(style: &FrameStyle) -> FrameSettings {
    FrameSettings {
        trail_opacity: style.trail_opacity,
        bloom_strength: style.bloom_strength,
        bloom_radius: style.bloom_radius,
        fog_density: style.fog_density,
        background: style.background.to_array(),
    }
}

impl crate::ShowState {
    /// Draw the current frame. A no-op without a renderer.
    pub(crate) fn render(&mut self) -> Result<(), RenderError> {
        let Some(renderer) = &mut self.renderer else {
            return Ok(());
        };

        let draws = self.show.draw_list();
        build_instances(draws, &mut self.instances);
        let settings = frame_settings(&draws.style);

        renderer.update_camera(&self.camera, &settings);
        renderer.render_frame(&self.instances, &settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{Rgb, Vec3};
    use simulation::FireworksConfig;

    #[test]
    fn instances_mirror_draw_list() {
        let mut list = DrawList::new();
        list.push(Vec3::new(1.0, 2.0, 3.0), 0.8, Rgb::new(0.5, 0.25, 2.0));
        list.push(Vec3::ZERO, 1.5, Rgb::WHITE);

        let mut out = vec![PointInstance::new([9.0; 3], 9.0, [9.0; 3])];
        build_instances(&list, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(out[0].size, 0.8);
        assert_eq!(out[0].color, [0.5, 0.25, 2.0, 1.0]);
    }

    #[test]
    fn settings_follow_style() {
        let style = FrameStyle::from_config(&FireworksConfig::default());
        let settings = frame_settings(&style);
        assert_eq!(settings.trail_opacity, 0.2);
        assert_eq!(settings.bloom_strength, 1.5);
        assert_eq!(settings.fog_density, 0.002);
        assert!(settings.background[2] > settings.background[1]);
    }
}
