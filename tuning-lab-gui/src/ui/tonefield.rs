//! # Tonefield Canvas
//!
//! Interactive view of the tonefield in normalized coordinates (`[-1, 1]` on
//! both axes, short axis horizontal, long axis vertical). Draws the boundary,
//! axes, grid, the tonefield ellipse with its dimple, the predicted hit point
//! and any user-selected coordinates. Left clicks inside the square are
//! reported back as normalized coordinates.

use iced::widget::canvas::{self, Event, Frame, Geometry, Path, Stroke, Text, event};
use iced::widget::container;
use iced::{Color, Element, Point, Rectangle, Renderer, Size, Theme, mouse};
use tuning_lab_core::geometry::TonefieldShape;
use tuning_lab_core::plot::strength_rgb;

/// Side length of the canvas in pixels.
pub const CANVAS_SIZE: f32 = 600.0;
/// Gap between the canvas edge and the `[-1, 1]` square.
const PADDING: f32 = 50.0;
const GRID_STEP: f64 = 0.2;
const ELLIPSE_SEGMENTS: usize = 96;

const BOUNDARY_COLOR: Color = Color::from_rgb(0.55, 0.55, 0.55);
const AXIS_COLOR: Color = Color::from_rgb(0.75, 0.75, 0.75);
const GRID_COLOR: Color = Color::from_rgba(0.6, 0.6, 0.6, 0.2);
const ELLIPSE_COLOR: Color = Color::from_rgb(0.20, 0.60, 0.86);
const DIMPLE_COLOR: Color = Color::from_rgb(0.56, 0.27, 0.68);
const SELECTED_COLOR: Color = Color::from_rgb(0.95, 0.61, 0.07);
const HIT_MARKER_COLOR: Color = Color::from_rgb(0.18, 0.80, 0.44);

/// Maps normalized coordinates to canvas pixels within a square of `side`.
pub fn to_canvas(x: f64, y: f64, side: f32) -> Point {
    let inner = side - 2.0 * PADDING;
    Point::new(
        PADDING + ((x + 1.0) / 2.0) as f32 * inner,
        PADDING + ((1.0 - y) / 2.0) as f32 * inner,
    )
}

/// Inverse of [`to_canvas`]. `None` when the point lies outside the square.
pub fn from_canvas(point: Point, side: f32) -> Option<(f64, f64)> {
    let inner = f64::from(side - 2.0 * PADDING);
    if inner <= 0.0 {
        return None;
    }
    let x = f64::from(point.x - PADDING) / inner * 2.0 - 1.0;
    let y = 1.0 - f64::from(point.y - PADDING) / inner * 2.0;
    ((-1.0..=1.0).contains(&x) && (-1.0..=1.0).contains(&y)).then_some((x, y))
}

/// Rounds a coordinate to three decimals, the resolution kept for selections.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// The plot strength color as an iced color.
pub fn hit_color(strength: f64) -> Color {
    let (r, g, b) = strength_rgb(strength);
    Color::from_rgb8(r, g, b)
}

/// Predicted hit point, already in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlottedHit {
    pub x: f64,
    pub y: f64,
    pub strength: f64,
}

#[derive(Debug, Clone)]
pub struct Tonefield {
    shape: TonefieldShape,
    prediction: Option<PlottedHit>,
    selected: Vec<(f64, f64)>,
    hit_marker: Option<(f64, f64)>,
}

impl Tonefield {
    pub fn new(
        shape: TonefieldShape,
        prediction: Option<PlottedHit>,
        selected: Vec<(f64, f64)>,
        hit_marker: Option<(f64, f64)>,
    ) -> Self {
        Self {
            shape,
            prediction,
            selected,
            hit_marker,
        }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fixed(CANVAS_SIZE))
                .height(iced::Length::Fixed(CANVAS_SIZE)),
        )
        .into()
    }

    fn draw_grid(&self, frame: &mut Frame, side: f32) {
        let steps = (2.0 / GRID_STEP).round() as i32;
        let stroke = Stroke::default().with_width(1.0).with_color(GRID_COLOR);
        for i in 0..=steps {
            let v = -1.0 + f64::from(i) * GRID_STEP;
            frame.stroke(&Path::line(to_canvas(v, -1.0, side), to_canvas(v, 1.0, side)), stroke);
            frame.stroke(&Path::line(to_canvas(-1.0, v, side), to_canvas(1.0, v, side)), stroke);
        }
    }

    fn ellipse_path(rx: f64, ry: f64, side: f32) -> Path {
        Path::new(|builder| {
            for i in 0..=ELLIPSE_SEGMENTS {
                let theta = i as f64 / ELLIPSE_SEGMENTS as f64 * std::f64::consts::TAU;
                let point = to_canvas(rx * theta.cos(), ry * theta.sin(), side);
                if i == 0 {
                    builder.move_to(point);
                } else {
                    builder.line_to(point);
                }
            }
            builder.close();
        })
    }
}

fn label(content: impl Into<String>, position: Point, color: Color, size: f32) -> Text {
    Text {
        content: content.into(),
        position,
        color,
        size: size.into(),
        horizontal_alignment: iced::alignment::Horizontal::Center,
        vertical_alignment: iced::alignment::Vertical::Center,
        ..Text::default()
    }
}

impl<Message> canvas::Program<Message> for Tonefield
where
    Message: From<crate::Message>,
{
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        event: Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (event::Status, Option<Message>) {
        if let Some(position) = cursor.position_in(bounds) {
            if let Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) = event {
                let side = bounds.width.min(bounds.height);
                if let Some((x, y)) = from_canvas(position, side) {
                    return (
                        event::Status::Captured,
                        Some(crate::Message::CanvasClicked(x, y).into()),
                    );
                }
            }
        }
        (event::Status::Ignored, None)
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let side = bounds.width.min(bounds.height);
        let text_color = theme.palette().text;

        self.draw_grid(&mut frame, side);

        let top_left = to_canvas(-1.0, 1.0, side);
        let square = Path::rectangle(top_left, Size::new(side - 2.0 * PADDING, side - 2.0 * PADDING));
        frame.stroke(&square, Stroke::default().with_width(2.0).with_color(BOUNDARY_COLOR));

        let axis = Stroke::default().with_width(1.5).with_color(AXIS_COLOR);
        frame.stroke(&Path::line(to_canvas(-1.0, 0.0, side), to_canvas(1.0, 0.0, side)), axis);
        frame.stroke(&Path::line(to_canvas(0.0, -1.0, side), to_canvas(0.0, 1.0, side)), axis);

        let (rx, ry) = self.shape.radii();
        frame.stroke(
            &Self::ellipse_path(rx, ry, side),
            Stroke::default().with_width(2.5).with_color(ELLIPSE_COLOR),
        );
        let (dx, dy) = self.shape.dimple_radii();
        frame.stroke(
            &Self::ellipse_path(dx, dy, side),
            Stroke::default().with_width(2.0).with_color(DIMPLE_COLOR),
        );

        frame.fill(&Path::circle(to_canvas(0.0, 0.0, side), 4.0), text_color);
        frame.fill_text(label("Origin (0, 0)", Point::new(side / 2.0 + 42.0, side / 2.0 + 12.0), text_color, 12.0));
        frame.fill_text(label("S (short axis)", Point::new(side / 2.0, side - PADDING / 2.0), text_color, 14.0));
        frame.fill_text(label("L (long axis)", Point::new(side / 2.0, PADDING / 2.0), text_color, 14.0));
        for tick in [-1.0, 0.0, 1.0] {
            let below = to_canvas(tick, -1.0, side);
            frame.fill_text(label(format!("{tick:.0}"), Point::new(below.x, below.y + 12.0), text_color, 12.0));
            let left = to_canvas(-1.0, tick, side);
            frame.fill_text(label(format!("{tick:.0}"), Point::new(left.x - 14.0, left.y), text_color, 12.0));
        }

        for (i, &(x, y)) in self.selected.iter().enumerate() {
            let center = to_canvas(x, y, side);
            frame.fill(&Path::circle(center, 6.0), SELECTED_COLOR);
            frame.fill_text(label(
                format!("{}", i + 1),
                Point::new(center.x + 10.0, center.y - 10.0),
                SELECTED_COLOR,
                12.0,
            ));
        }

        if let Some(hit) = self.prediction {
            let center = to_canvas(hit.x, hit.y, side);
            let color = hit_color(hit.strength);
            frame.fill(&Path::circle(center, 9.0), color);
            frame.stroke(&Path::circle(center, 9.0), Stroke::default().with_width(2.0).with_color(Color::WHITE));
            frame.fill_text(label(
                format!("Hit ({:.2})", hit.strength),
                Point::new(center.x, center.y - 18.0),
                color,
                13.0,
            ));
        }

        if let Some((x, y)) = self.hit_marker {
            let center = to_canvas(x, y, side);
            let stroke = Stroke::default().with_width(2.5).with_color(HIT_MARKER_COLOR);
            frame.stroke(&Path::line(Point::new(center.x - 8.0, center.y - 8.0), Point::new(center.x + 8.0, center.y + 8.0)), stroke);
            frame.stroke(&Path::line(Point::new(center.x - 8.0, center.y + 8.0), Point::new(center.x + 8.0, center.y - 8.0)), stroke);
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn corners_map_to_padded_square() {
        let top_left = to_canvas(-1.0, 1.0, CANVAS_SIZE);
        assert_eq!(top_left, Point::new(PADDING, PADDING));
        let bottom_right = to_canvas(1.0, -1.0, CANVAS_SIZE);
        assert_eq!(bottom_right, Point::new(CANVAS_SIZE - PADDING, CANVAS_SIZE - PADDING));
        assert_eq!(to_canvas(0.0, 0.0, CANVAS_SIZE), Point::new(300.0, 300.0));
    }

    #[test]
    fn clicks_convert_back_to_coordinates() {
        let (x, y) = from_canvas(to_canvas(0.25, -0.6, CANVAS_SIZE), CANVAS_SIZE).unwrap();
        assert!(close(x, 0.25));
        assert!(close(y, -0.6));
    }

    #[test]
    fn clicks_in_padding_are_ignored() {
        assert!(from_canvas(Point::new(10.0, 300.0), CANVAS_SIZE).is_none());
        assert!(from_canvas(Point::new(300.0, 590.0), CANVAS_SIZE).is_none());
    }

    #[test]
    fn rounding_keeps_three_decimals() {
        assert_eq!(round3(0.123456), 0.123);
        assert_eq!(round3(-0.9996), -1.0);
    }

    #[test]
    fn hit_color_matches_the_plot_color() {
        let (r, g, b) = strength_rgb(4.0);
        assert_eq!(hit_color(4.0), Color::from_rgb8(r, g, b));
        let negative = hit_color(-4.0);
        assert!(negative.b > negative.r);
        let positive = hit_color(4.0);
        assert!(positive.r > positive.b);
    }
}
