use crate::math::Color;
use crate::scene::Scene;

/// Built-in scenes selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenePreset {
    /// 7×7 cells with gentle relief and a few tinted cliffs.
    Terrain,
    /// Level ground; only top plates, a baseline for the direct-light falloff.
    Flat,
    /// A larger, rougher grid with deep steps and mostly colored cliff faces.
    Canyon,
}

impl ScenePreset {
    pub fn build(self) -> Scene {
        match self {
            ScenePreset::Terrain => Scene::default(),
            ScenePreset::Flat => Scene {
                max_depth: 0,
                depth_rate: 0,
                ..Scene::default()
            },
            ScenePreset::Canyon => Scene {
                width: 9,
                height: 9,
                max_depth: 4,
                depth_rate: 60,
                color_rate: 70,
                retransmission: 0.6,
                decay_distance: 14.0,
                wavelength_decay: Color::new(0.7, 0.85, 1.0),
                max_passes: 5,
                ..Scene::default()
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScenePreset::Terrain => "Terrain",
            ScenePreset::Flat => "Flat",
            ScenePreset::Canyon => "Canyon",
        }
    }
}
