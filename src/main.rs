use std::process::ExitCode;

use anyhow::Result;

mod camera;
mod config;
mod importer;
mod light;
mod model;
mod rendering;
mod scene_graph;
mod viewer;
mod window;

fn main() -> Result<ExitCode> {
    let mut logger = pretty_env_logger::formatted_builder();
    logger.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }
    logger.init();

    log::info!("Starting Berserk...");

    let config = config::ViewerConfig::from_args(std::env::args())?;

    pollster::block_on(window::run(config))
}
