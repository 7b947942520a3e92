//! Draws one [`Frame`] onto any [`Surface`].
//!
//! The draw order is fixed: background, beacons, route, user marker, then
//! the coordinate readout, so the user marker always ends up on top.

use indoor_map_geometry::{PixelPoint, ViewTransform};
use macroquad::color::{BLACK, Color};

use crate::blackboard::Frame;

pub const BEACON_COLOR: Color = Color::new(0.0, 0.0, 1.0, 0.7);
pub const ROUTE_COLOR: Color = Color::new(0.0, 200.0 / 255.0, 0.0, 0.8);
pub const USER_COLOR: Color = Color::new(1.0, 0.0, 0.0, 0.9);
pub const LABEL_COLOR: Color = BLACK;

pub const BEACON_SIZE: f32 = 10.0;
pub const LABEL_OFFSET: (f32, f32) = (8.0, 4.0);
pub const ROUTE_WIDTH: f32 = 3.0;
pub const USER_RADIUS: f32 = 8.0;
pub const READOUT_POS: (f32, f32) = (10.0, 20.0);

/// A 2D drawing target, in pixels from the top-left corner.
pub trait Surface {
    fn clear(&mut self);

    /// Draws the floor plan stretched over the whole surface. A surface
    /// without a background image draws nothing here.
    fn draw_background(&mut self);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Color);

    /// One connected line through `points`, in order.
    fn stroke_polyline(&mut self, points: &[(f32, f32)], width: f32, color: Color);

    /// `y` is the text baseline.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, color: Color);
}

fn pixel(px: PixelPoint) -> (f32, f32) {
    (px.x as f32, px.y as f32)
}

pub fn render<S: Surface + ?Sized>(surface: &mut S, frame: &Frame, view: &ViewTransform) {
    surface.clear();
    surface.draw_background();

    for beacon in frame.beacons.iter() {
        let (x, y) = pixel(view.to_screen(beacon.position()));
        let half = BEACON_SIZE / 2.0;
        surface.fill_rect(x - half, y - half, BEACON_SIZE, BEACON_SIZE, BEACON_COLOR);
        surface.fill_text(&beacon.name, x + LABEL_OFFSET.0, y + LABEL_OFFSET.1, LABEL_COLOR);
    }

    if frame.route.len() > 1 {
        let points: Vec<(f32, f32)> = frame
            .route
            .iter()
            .map(|p| pixel(view.to_screen(*p)))
            .collect();
        surface.stroke_polyline(&points, ROUTE_WIDTH, ROUTE_COLOR);
    }

    let (ux, uy) = pixel(view.to_screen(frame.user_position));
    surface.fill_circle(ux, uy, USER_RADIUS, USER_COLOR);

    surface.fill_text(&readout(frame), READOUT_POS.0, READOUT_POS.1, LABEL_COLOR);
}

pub fn readout(frame: &Frame) -> String {
    format!(
        "X: {:.2}, Y: {:.2}",
        frame.user_position.x, frame.user_position.y
    )
}
