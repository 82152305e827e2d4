use std::path::PathBuf;

use anyhow::Context;
use glam::Vec3;

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub surface_id: String,
    pub title: String,
    pub width: u32,
    pub height: u32,

    pub asset_root: PathBuf,
    pub model_url: String,

    pub clear_color: [f64; 4],

    pub camera_alpha: f32,
    pub camera_beta: f32,
    pub camera_radius: f32,
    pub camera_target: Vec3,
    pub camera_radius_limits: (f32, f32),

    pub light_direction: Vec3,
    pub light_intensity: f32,
    pub ambient: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            surface_id: "game".to_string(),
            title: "Berserk".to_string(),
            width: 1280,
            height: 720,

            asset_root: PathBuf::from("public"),
            model_url: "/models/soldier.glb".to_string(),

            clear_color: [0.02, 0.02, 0.025, 1.0],

            camera_alpha: std::f32::consts::PI * 1.25,
            camera_beta: std::f32::consts::PI / 2.5,
            camera_radius: 6.0,
            camera_target: Vec3::new(0.0, 1.0, 0.0),
            camera_radius_limits: (3.0, 12.0),

            light_direction: Vec3::new(-1.0, -2.0, -1.0),
            light_intensity: 2.2,
            ambient: 0.05,
        }
    }
}

impl ViewerConfig {
    /// Applies `--flag=value` overrides on top of the defaults.
    /// The first item is expected to be the program name, as with `std::env::args`.
    pub fn from_args<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();

        for arg in args.into_iter().skip(1) {
            if let Some(value) = arg.strip_prefix("--assets=") {
                config.asset_root = PathBuf::from(value);
            } else if let Some(value) = arg.strip_prefix("--model=") {
                config.model_url = value.to_string();
            } else if let Some(value) = arg.strip_prefix("--surface=") {
                if value.is_empty() {
                    anyhow::bail!("--surface must not be empty");
                }
                config.surface_id = value.to_string();
            } else if let Some(value) = arg.strip_prefix("--size=") {
                let (width, height) =
                    parse_size(value).with_context(|| format!("Invalid --size value: {value}"))?;
                config.width = width;
                config.height = height;
            } else {
                log::warn!("Ignoring unknown argument: {arg}");
            }
        }

        Ok(config)
    }

    /// Resolves the model request path against the asset root.
    pub fn model_path(&self) -> PathBuf {
        self.asset_root
            .join(self.model_url.trim_start_matches(['/', '\\']))
    }

    /// Window title carrying the surface id, so the surface can be told apart in window lists.
    pub fn window_title(&self) -> String {
        format!("{} [{}]", self.title, self.surface_id)
    }
}

fn parse_size(value: &str) -> anyhow::Result<(u32, u32)> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .context("Expected WIDTHxHEIGHT")?;
    let width: u32 = width.parse().context("Width is not a number")?;
    let height: u32 = height.parse().context("Height is not a number")?;

    if width == 0 || height == 0 {
        anyhow::bail!("Size must be non-zero");
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("berserk")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults_match_the_viewer_setup() {
        let config = ViewerConfig::default();
        assert_eq!(config.surface_id, "game");
        assert_eq!(config.camera_radius_limits, (3.0, 12.0));
        assert_eq!(config.light_direction, Vec3::new(-1.0, -2.0, -1.0));
        assert!((config.light_intensity - 2.2).abs() < 1e-6);
        assert!((config.camera_alpha.to_degrees() - 225.0).abs() < 1e-3);
        assert!((config.camera_beta.to_degrees() - 72.0).abs() < 1e-3);
    }

    #[test]
    fn model_path_strips_leading_slash() {
        let config = ViewerConfig::default();
        assert_eq!(
            config.model_path(),
            PathBuf::from("public").join("models/soldier.glb")
        );
    }

    #[test]
    fn window_title_names_the_surface() {
        let mut config = ViewerConfig::default();
        assert_eq!(config.window_title(), "Berserk [game]");

        config.surface_id = "viewport".to_string();
        assert_eq!(config.window_title(), "Berserk [viewport]");
    }

    #[test]
    fn overrides_from_args() {
        let config = ViewerConfig::from_args(args(&[
            "--assets=/srv/static",
            "--model=/models/knight.glb",
            "--size=800x600",
            "--surface=viewport",
        ]))
        .unwrap();

        assert_eq!(config.asset_root, PathBuf::from("/srv/static"));
        assert_eq!(config.model_url, "/models/knight.glb");
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.surface_id, "viewport");
    }

    #[test]
    fn unknown_args_are_ignored() {
        let config = ViewerConfig::from_args(args(&["--fullscreen"])).unwrap();
        assert_eq!(config.model_url, "/models/soldier.glb");
    }

    #[test]
    fn malformed_size_is_an_error() {
        assert!(ViewerConfig::from_args(args(&["--size=800"])).is_err());
        assert!(ViewerConfig::from_args(args(&["--size=0x600"])).is_err());
        assert!(ViewerConfig::from_args(args(&["--size=axb"])).is_err());
    }

    #[test]
    fn empty_surface_id_is_an_error() {
        assert!(ViewerConfig::from_args(args(&["--surface="])).is_err());
    }
}
