use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{load_viewer_config_from_env, ViewerConfig, ViewerConfigError};
use super::demo_world::{DemoGame, DemoWorld};

pub(crate) struct AppWiring {
    pub(crate) config: ViewerConfig,
    pub(crate) world: DemoWorld,
    pub(crate) game: DemoGame,
}

pub(crate) fn build_app() -> Result<AppWiring, ViewerConfigError> {
    init_tracing();
    info!("=== Isoview Startup ===");

    let config = load_viewer_config_from_env()?;
    info!(
        window_width = config.window_width,
        window_height = config.window_height,
        map_width = config.map_width,
        map_height = config.map_height,
        npc_count = config.npc_count,
        render_range_tiles = config.render.render_range_tiles,
        "viewer_config_loaded"
    );

    let world = DemoWorld::generate(config.map_width, config.map_height);
    let game = DemoGame::new(&world, config.npc_count);
    Ok(AppWiring {
        config,
        world,
        game,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
