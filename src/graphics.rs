use macroquad::prelude::*;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use indoor_map_geometry::{PixelPoint, ViewTransform};

use crate::blackboard::{Blackboard, Frame, dismiss_alert};
use crate::bus::Topic;
use crate::config::load_settings;
use crate::error::MapError;
use crate::render::{Surface, render};
use crate::session::BackgroundStatus;

const LABEL_FONT_SIZE: f32 = 16.0;
const ALERT_FONT_SIZE: f32 = 22.0;
const ALERT_HINT: &str = "Click or press Enter to continue";

// Function to configure the macroquad window
pub fn window_conf() -> Conf {
    // Runs before logging is up; a broken config is reported again by main.
    let window = load_settings().map(|s| s.window).unwrap_or_default();
    Conf {
        window_title: window.title,
        window_width: window.width,
        window_height: window.height,
        high_dpi: false,
        ..Default::default()
    }
}

/// The macroquad window as a render target.
pub struct MapSurface {
    background: Option<Texture2D>,
}

impl MapSurface {
    pub fn new(background: Option<Texture2D>) -> Self {
        Self { background }
    }
}

impl Surface for MapSurface {
    fn clear(&mut self) {
        clear_background(WHITE);
    }

    fn draw_background(&mut self) {
        if let Some(texture) = &self.background {
            draw_texture_ex(
                texture,
                0.0,
                0.0,
                WHITE,
                DrawTextureParams {
                    dest_size: Some(vec2(screen_width(), screen_height())),
                    ..Default::default()
                },
            );
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        draw_rectangle(x, y, w, h, color);
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Color) {
        draw_circle(x, y, radius, color);
    }

    fn stroke_polyline(&mut self, points: &[(f32, f32)], width: f32, color: Color) {
        for pair in points.windows(2) {
            let ((x1, y1), (x2, y2)) = (pair[0], pair[1]);
            draw_line(x1, y1, x2, y2, width, color);
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Color) {
        draw_text(text, x, y, LABEL_FONT_SIZE, color);
    }
}

/// Loads the floor plan. A missing or broken image only costs the background.
pub async fn load_background(path: &str) -> (Option<Texture2D>, BackgroundStatus) {
    let image = match macroquad::file::load_file(path).await {
        Ok(bytes) => decode_background(path, &bytes),
        Err(e) => Err(MapError::ResourceLoad {
            path: path.to_string(),
            reason: format!("{:?}", e),
        }),
    };
    match image {
        Ok(image) => {
            info!(path, width = image.width, height = image.height, "Floor plan loaded.");
            (Some(Texture2D::from_image(&image)), BackgroundStatus::Loaded)
        }
        Err(err) => {
            warn!(error = %err, kind = err.kind(), "Floor plan unavailable, continuing without it.");
            (None, BackgroundStatus::Unavailable)
        }
    }
}

/// Decodes floor-plan bytes without touching the GPU.
fn decode_background(path: &str, bytes: &[u8]) -> Result<Image, MapError> {
    Image::from_file_with_format(bytes, None).map_err(|e| MapError::ResourceLoad {
        path: path.to_string(),
        reason: format!("{:?}", e),
    })
}

fn draw_alert(message: &str) {
    let (w, h) = (screen_width(), screen_height());
    draw_rectangle(0.0, 0.0, w, h, Color::new(0.0, 0.0, 0.0, 0.45));

    let box_w = (measure_text(message, None, ALERT_FONT_SIZE as u16, 1.0).width + 40.0).min(w - 20.0);
    let box_h = 90.0;
    let (bx, by) = ((w - box_w) / 2.0, (h - box_h) / 2.0);
    draw_rectangle(bx, by, box_w, box_h, WHITE);
    draw_rectangle_lines(bx, by, box_w, box_h, 2.0, DARKGRAY);
    draw_text(message, bx + 20.0, by + 38.0, ALERT_FONT_SIZE, BLACK);
    draw_text(ALERT_HINT, bx + 20.0, by + 68.0, LABEL_FONT_SIZE, GRAY);
}

/// Empties the receiver, keeping only the newest frame. Returns `false` once
/// the channel is closed.
fn drain_latest(frame_rx: &mut broadcast::Receiver<Arc<Frame>>, current: &mut Arc<Frame>) -> bool {
    loop {
        match frame_rx.try_recv() {
            Ok(frame) => *current = frame,
            Err(broadcast::error::TryRecvError::Empty) => return true,
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                // older frames are stale anyway
                warn!(skipped, "Visualization frame receiver lagged.");
            }
            Err(broadcast::error::TryRecvError::Closed) => return false,
        }
    }
}

pub async fn run_visualization_loop(
    mut frame_rx: broadcast::Receiver<Arc<Frame>>,
    pointer: Topic<PixelPoint>,
    board: Blackboard,
    mut surface: MapSurface,
    view: ViewTransform,
) {
    let mut current_frame: Arc<Frame> = Arc::default();

    info!("Visualization loop starting inside graphics module...");

    loop {
        if !drain_latest(&mut frame_rx, &mut current_frame) {
            error!("Frame channel closed. Exiting visualization loop.");
            break;
        }

        render(&mut surface, &current_frame, &view);

        // The alert swallows input until it is dismissed.
        let alert = board.read().alert.clone();
        match alert {
            Some(message) => {
                draw_alert(&message);
                if is_mouse_button_pressed(MouseButton::Left) || is_key_pressed(KeyCode::Enter) {
                    dismiss_alert(&board);
                    info!("Alert dismissed.");
                }
            }
            None => {
                if is_mouse_button_pressed(MouseButton::Left) {
                    let (x, y) = mouse_position();
                    pointer.publish(PixelPoint::new(x as f64, y as f64));
                }
            }
        }

        next_frame().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoor_map_geometry::Point;

    fn frame_at(x: f64) -> Frame {
        Frame {
            user_position: Point::new(x, 0.0),
            ..Frame::default()
        }
    }

    #[test]
    fn test_corrupt_background_is_resource_error() {
        let result = decode_background("assets/floor_plan.png", b"this is not a png");
        assert!(matches!(
            result,
            Err(MapError::ResourceLoad { ref path, .. }) if path == "assets/floor_plan.png"
        ));
    }

    #[test]
    fn test_truncated_png_is_resource_error() {
        // valid signature, no chunks
        let bytes = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        assert!(decode_background("plan.png", &bytes).is_err());
    }

    #[test]
    fn test_drain_keeps_newest_frame() {
        let topic: Topic<Frame> = Topic::new("frames", 8);
        let mut rx = topic.subscribe();
        for x in [1.0, 2.0, 3.0] {
            topic.publish(frame_at(x));
        }

        let mut current = Arc::new(Frame::default());
        assert!(drain_latest(&mut rx, &mut current));
        assert_eq!(current.user_position, Point::new(3.0, 0.0));
    }

    #[test]
    fn test_drain_recovers_from_lag() {
        let topic: Topic<Frame> = Topic::new("frames", 2);
        let mut rx = topic.subscribe();
        for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
            topic.publish(frame_at(x));
        }

        let mut current = Arc::new(Frame::default());
        assert!(drain_latest(&mut rx, &mut current));
        assert_eq!(current.user_position, Point::new(5.0, 0.0));
    }

    #[test]
    fn test_drain_reports_closed_channel() {
        let topic: Topic<Frame> = Topic::new("frames", 2);
        let mut rx = topic.subscribe();
        topic.publish(frame_at(7.0));
        drop(topic);

        let mut current = Arc::new(Frame::default());
        assert!(!drain_latest(&mut rx, &mut current));
        assert_eq!(current.user_position, Point::new(7.0, 0.0));
    }
}
