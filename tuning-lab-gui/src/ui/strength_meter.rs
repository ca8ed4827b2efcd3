//! # Strength Meter Widget
//!
//! Horizontal bar showing the predicted hit strength from 0.0 to 1.0,
//! filled with the same color the tonefield uses for the hit point.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Point, Rectangle, Renderer, Size, Theme, mouse};

use super::tonefield::hit_color;

pub struct StrengthMeter {
    /// Current strength (None before the first prediction)
    strength: Option<f64>,
}

impl StrengthMeter {
    pub fn new(strength: Option<f64>) -> Self {
        Self { strength }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(24.0)),
        )
        .into()
    }
}

impl<Message> canvas::Program<Message> for StrengthMeter {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let background = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.fill(&background, Color::from_rgb8(0x40, 0x40, 0x40));

        if let Some(strength) = self.strength {
            let fraction = strength.clamp(0.0, 1.0) as f32;
            let bar = Path::rectangle(Point::ORIGIN, Size::new(fraction * bounds.width, bounds.height));
            frame.fill(&bar, hit_color(strength));
        }

        // Quarter ticks
        for i in 1..4 {
            let x = bounds.width * i as f32 / 4.0;
            frame.stroke(
                &Path::line(Point::new(x, 0.0), Point::new(x, bounds.height)),
                Stroke::default()
                    .with_width(1.0)
                    .with_color(Color::from_rgba(1.0, 1.0, 1.0, 0.3)),
            );
        }

        vec![frame.into_geometry()]
    }
}
