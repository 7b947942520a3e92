mod blackboard; // shared session state and render frames
mod bus; // broadcast topics between the window and the runtime
mod client; // HTTP backend client
mod config; // settings loading and validation
mod error;
mod graphics; // macroquad window, input and drawing
mod render;
mod session; // startup sequencing, polling and route requests

use blackboard::{Blackboard, Frame};
use bus::Topic;
use client::BackendClient;
use graphics::{MapSurface, window_conf};
use indoor_map_geometry::PixelPoint;
use session::SessionController;

use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Indoor map viewer started.");

    if let Err(e) = run().await {
        error!("Indoor map viewer failed to start: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let settings = crate::config::load_settings()?;
    let view = settings.view_transform()?;
    let base_url = settings.base_url()?;
    let backend = BackendClient::new(&base_url, settings.request_timeout())?;
    info!(%view, %base_url, interval = ?settings.poll_interval(), "Configuration validated.");

    let tokio_rt = tokio::runtime::Runtime::new()?;

    let board: Blackboard = Arc::default();
    let frame_topic: Topic<Frame> = Topic::new("frames", 4);
    let pointer_topic: Topic<PixelPoint> = Topic::new("pointer", 16);
    let frame_rx = frame_topic.subscribe();
    let pointer_rx = pointer_topic.subscribe();

    // The beacon fetch waits until the floor plan has settled, loaded or not.
    let (texture, background) = graphics::load_background(&settings.session.background_path).await;

    let controller = Arc::new(SessionController::new(
        backend,
        Arc::clone(&board),
        view,
        frame_topic,
        settings.poll_interval(),
    ));

    tokio_rt.spawn(async move {
        info!("Session task started.");
        match controller.run(background, pointer_rx).await {
            Ok(_) => info!("Session tasks finished."),
            Err(e) => error!("Session tasks failed: {:?}. Map updates have stopped.", e),
        }
    });

    graphics::run_visualization_loop(frame_rx, pointer_topic, board, MapSurface::new(texture), view)
        .await;

    info!("Window closed, shutting down.");
    Ok(())
}
