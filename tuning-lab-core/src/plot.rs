//! # Plot Utilities Module
//!
//! Renders the tonefield coordinate system as an SVG document with
//! `plotters`. A [`Figure`] records what should be drawn (axes, square
//! boundary, target ellipse, hit point, selected points) and draws it all
//! onto an `SVGBackend` in [`Figure::render`].
//!
//! ## Example
//! ```
//! use tuning_lab_core::plot::{Figure, HitPointStyle, LineStyle};
//!
//! let mut fig = Figure::new(640, 640);
//! fig.setup_tonefield_axes(100.0, "Tonefield Coordinate System", true);
//! fig.draw_square_boundary(100.0, &LineStyle::boundary(), "Boundary");
//! fig.draw_hit_point(10.0, -5.0, 0.7, &HitPointStyle::default());
//! let svg = fig.render().unwrap();
//! assert!(svg.starts_with("<svg"));
//! ```

use std::error::Error;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::{LabError, Result};
use crate::geometry::TonefieldGeometry;
use crate::model::HitPoint;

type DrawResult = std::result::Result<(), Box<dyn Error>>;

const DARK_RED: RGBColor = RGBColor(139, 0, 0);
const DARK_GREEN: RGBColor = RGBColor(0, 128, 0);
const ELLIPSE_SEGMENTS: usize = 120;

/// Stroke color and width of a line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: RGBColor,
    pub width: u32,
}

impl LineStyle {
    pub fn new(color: RGBColor, width: u32) -> Self {
        Self { color, width }
    }

    /// Blue, 2px: the square tonefield boundary.
    pub fn boundary() -> Self {
        Self::new(BLUE, 2)
    }
}

/// Outline style of a target-zone ellipse.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipseStyle {
    pub color: RGBColor,
    pub width: u32,
    pub dashed: bool,
    pub alpha: f64,
    pub label: String,
}

impl Default for EllipseStyle {
    fn default() -> Self {
        Self {
            color: DARK_GREEN,
            width: 2,
            dashed: true,
            alpha: 0.7,
            label: "Target zone".to_string(),
        }
    }
}

/// Marker style of a hit point. Marker area is `base_size + strength * max_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct HitPointStyle {
    pub base_size: f64,
    pub max_size: f64,
    pub color: RGBColor,
    pub edge_color: RGBColor,
    pub alpha: f64,
    pub show_label: bool,
}

impl Default for HitPointStyle {
    fn default() -> Self {
        Self {
            base_size: 50.0,
            max_size: 500.0,
            color: RED,
            edge_color: DARK_RED,
            alpha: 0.6,
            show_label: true,
        }
    }
}

impl HitPointStyle {
    /// Marker radius in pixels for a given strength. The size is an area,
    /// so the radius grows with its square root.
    pub fn radius(&self, strength: f64) -> f64 {
        (self.base_size + strength * self.max_size).max(0.0).sqrt() / 2.0
    }
}

#[derive(Debug, Clone)]
enum Layer {
    Boundary {
        size: f64,
        style: LineStyle,
        label: String,
    },
    Ellipse {
        center: (f64, f64),
        width: f64,
        height: f64,
        angle: f64,
        style: EllipseStyle,
    },
    Hit {
        l: f64,
        s: f64,
        strength: f64,
        style: HitPointStyle,
    },
    Points(Vec<(f64, f64)>),
}

/// A figure with a single pair of data axes, rendered to SVG.
#[derive(Debug, Clone)]
pub struct Figure {
    width: u32,
    height: u32,
    half_range: f64,
    title: String,
    show_grid: bool,
    layers: Vec<Layer>,
}

impl Figure {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            half_range: 1.0,
            title: "Tonefield Coordinate System".to_string(),
            show_grid: false,
            layers: Vec::new(),
        }
    }

    /// Sets equal axes of `±field_size / 2`, the title and an optional grid.
    pub fn setup_tonefield_axes(&mut self, field_size: f64, title: &str, show_grid: bool) {
        self.half_range = field_size.abs().max(f64::EPSILON) / 2.0;
        self.title = title.to_string();
        self.show_grid = show_grid;
    }

    /// Draws the square tonefield boundary centered on the origin.
    pub fn draw_square_boundary(&mut self, size: f64, style: &LineStyle, label: &str) {
        self.layers.push(Layer::Boundary {
            size,
            style: style.clone(),
            label: label.to_string(),
        });
    }

    /// Draws an ellipse outline. `width` and `height` are full extents in
    /// data units, `angle` is counter-clockwise in degrees.
    pub fn draw_ellipse(
        &mut self,
        center: (f64, f64),
        width: f64,
        height: f64,
        angle: f64,
        style: &EllipseStyle,
    ) {
        self.layers.push(Layer::Ellipse {
            center,
            width,
            height,
            angle,
            style: style.clone(),
        });
    }

    /// Draws a hit point whose marker size grows with `strength`, with an
    /// optional `(L, S)` label five units above it.
    pub fn draw_hit_point(&mut self, l: f64, s: f64, strength: f64, style: &HitPointStyle) {
        self.layers.push(Layer::Hit {
            l,
            s,
            strength,
            style: style.clone(),
        });
    }

    /// Draws numbered green `x` markers for a list of selected coordinates.
    pub fn draw_points(&mut self, points: &[(f64, f64)]) {
        if !points.is_empty() {
            self.layers.push(Layer::Points(points.to_vec()));
        }
    }

    /// Produces the complete SVG document.
    pub fn render(&self) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height)).into_drawing_area();
            self.draw_on(&root).map_err(|err| LabError::Plot(err.to_string()))?;
            root.present().map_err(|err| LabError::Plot(err.to_string()))?;
        }
        Ok(svg)
    }

    fn draw_on(&self, root: &DrawingArea<SVGBackend<'_>, Shift>) -> DrawResult {
        root.fill(&WHITE)?;
        let h = self.half_range;

        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, ("sans-serif", 18))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(55)
            .build_cartesian_2d(-h..h, -h..h)?;

        let mut mesh = chart.configure_mesh();
        mesh.x_desc("L (Long dimension)").y_desc("S (Short dimension)");
        if !self.show_grid {
            mesh.disable_mesh();
        }
        mesh.draw()?;

        // Zero lines
        let zero = BLACK.mix(0.5).stroke_width(1);
        chart.draw_series(LineSeries::new(vec![(-h, 0.0), (h, 0.0)], zero))?;
        chart.draw_series(LineSeries::new(vec![(0.0, -h), (0.0, h)], zero))?;

        let mut has_legend = false;
        for layer in &self.layers {
            has_legend = true;
            match layer {
                Layer::Boundary { size, style, label } => {
                    let half = size / 2.0;
                    let stroke = style.color.stroke_width(style.width);
                    chart
                        .draw_series(std::iter::once(Rectangle::new([(-half, half), (half, -half)], stroke)))?
                        .label(label.as_str())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], stroke));
                }
                Layer::Ellipse {
                    center,
                    width,
                    height,
                    angle,
                    style,
                } => {
                    let points = ellipse_points(*center, width / 2.0, height / 2.0, *angle);
                    let stroke = style.color.mix(style.alpha).stroke_width(style.width);
                    let anno = if style.dashed {
                        chart.draw_series(DashedLineSeries::new(points, 6, 4, stroke))?
                    } else {
                        chart.draw_series(LineSeries::new(points, stroke))?
                    };
                    anno.label(style.label.as_str())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], stroke));
                }
                Layer::Hit {
                    l,
                    s,
                    strength,
                    style,
                } => {
                    let radius = style.radius(*strength).round() as u32;
                    let fill = style.color.mix(style.alpha).filled();
                    chart
                        .draw_series(std::iter::once(Circle::new((*l, *s), radius, fill)))?
                        .label(format!("Hit (strength={strength:.2})"))
                        .legend(move |(x, y)| Circle::new((x + 10, y), 5, fill));
                    chart.draw_series(std::iter::once(Circle::new(
                        (*l, *s),
                        radius,
                        style.edge_color.stroke_width(2),
                    )))?;

                    if style.show_label {
                        let font = TextStyle::from(("sans-serif", 12).into_font())
                            .pos(Pos::new(HPos::Center, VPos::Center));
                        chart.draw_series(std::iter::once(Text::new(
                            format!("({l:.1}, {s:.1})"),
                            (*l, *s + 5.0),
                            font,
                        )))?;
                    }
                }
                Layer::Points(points) => {
                    let marker = DARK_GREEN.stroke_width(2);
                    let font = TextStyle::from(("sans-serif", 11).into_font()).color(&DARK_GREEN);
                    chart
                        .draw_series(points.iter().enumerate().map(|(i, &(x, y))| {
                            EmptyElement::at((x, y))
                                + Cross::new((0, 0), 5, marker)
                                + Text::new(format!("{}", i + 1), (6, -16), font.clone())
                        }))?
                        .label("Selected Points")
                        .legend(move |(x, y)| Cross::new((x + 10, y), 5, marker));
                }
            }
        }

        if has_legend {
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .position(SeriesLabelPosition::UpperRight)
                .draw()?;
        }
        Ok(())
    }
}

/// Outline of an ellipse with semi-axes `rx`, `ry`, rotated `angle`
/// degrees counter-clockwise about `center`.
fn ellipse_points(center: (f64, f64), rx: f64, ry: f64, angle: f64) -> Vec<(f64, f64)> {
    let (sin, cos) = angle.to_radians().sin_cos();
    (0..=ELLIPSE_SEGMENTS)
        .map(|i| {
            let t = i as f64 / ELLIPSE_SEGMENTS as f64 * std::f64::consts::TAU;
            let (x, y) = (rx * t.cos(), ry * t.sin());
            (center.0 + x * cos - y * sin, center.1 + x * sin + y * cos)
        })
        .collect()
}

/// Color of a strength value: blue for negative, red for positive, more
/// saturated and darker as `|strength|` approaches 10.
pub fn strength_color(strength: f64) -> HSLColor {
    let intensity = (strength.abs() / 10.0).min(1.0);
    let saturation = 0.40 + intensity * 0.55;
    let lightness = 0.60 - intensity * 0.15;
    let hue = if strength < 0.0 { 240.0 / 360.0 } else { 0.0 };
    HSLColor(hue, saturation, lightness)
}

/// [`strength_color`] as 8-bit RGB, for front ends that do not use plotters.
pub fn strength_rgb(strength: f64) -> (u8, u8, u8) {
    strength_color(strength).rgb()
}

/// Builds the standard tonefield figure: axes, boundary, target ellipse and,
/// when `hit` carries a positive strength, the hit point.
pub fn tonefield_plot(
    hit: Option<&HitPoint>,
    geometry: &TonefieldGeometry,
    note_name: Option<&str>,
) -> Figure {
    let title = match note_name {
        Some(note) => format!("Tonefield Coordinate System ({note})"),
        None => "Tonefield Coordinate System".to_string(),
    };

    let mut fig = Figure::new(640, 640);
    fig.setup_tonefield_axes(geometry.field_size, &title, true);
    fig.draw_square_boundary(geometry.field_size, &LineStyle::boundary(), "Tonefield boundary");

    let ellipse = &geometry.ellipse;
    fig.draw_ellipse(
        (ellipse.center_x, ellipse.center_y),
        ellipse.semi_major * 2.0,
        ellipse.semi_minor * 2.0,
        ellipse.rotation,
        &EllipseStyle::default(),
    );

    if let Some(hit) = hit.filter(|h| h.strength > 0.0) {
        fig.draw_hit_point(hit.l, hit.s, hit.strength, &HitPointStyle::default());
    }
    fig
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_radius_grows_with_strength() {
        let style = HitPointStyle::default();
        assert!(style.radius(1.0) > style.radius(0.1));
        assert!((style.radius(0.0) - 50.0_f64.sqrt() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_plot_has_no_hit_marker() {
        let svg = tonefield_plot(None, &TonefieldGeometry::default(), None)
            .render()
            .unwrap();
        assert!(svg.contains("Tonefield boundary"));
        assert!(svg.contains("Target zone"));
        assert!(svg.contains("L (Long dimension)"));
        assert!(!svg.contains("Hit (strength"));
    }

    #[test]
    fn zero_strength_hit_is_not_drawn() {
        let hit = HitPoint {
            l: 1.0,
            s: 1.0,
            strength: 0.0,
        };
        let svg = tonefield_plot(Some(&hit), &TonefieldGeometry::default(), None)
            .render()
            .unwrap();
        assert!(!svg.contains("Hit (strength"));
    }

    #[test]
    fn hit_point_is_labelled_with_coordinates() {
        let hit = HitPoint {
            l: 10.0,
            s: -5.0,
            strength: 0.7,
        };
        let svg = tonefield_plot(Some(&hit), &TonefieldGeometry::default(), Some("A4"))
            .render()
            .unwrap();
        assert!(svg.contains("(10.0, -5.0)"));
        assert!(svg.contains("Hit (strength=0.70)"));
        assert!(svg.contains("Tonefield Coordinate System (A4)"));
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn selected_points_are_numbered() {
        let mut fig = Figure::new(400, 400);
        fig.setup_tonefield_axes(2.0, "Selection", false);
        fig.draw_points(&[(0.1, 0.2), (-0.5, 0.5), (0.3, -0.7)]);
        let svg = fig.render().unwrap();
        assert!(svg.contains("Selected Points"));
        for n in 1..=3 {
            assert!(svg.contains(&format!(">{n}</text>")), "missing marker {n}");
        }
    }

    #[test]
    fn no_points_adds_no_legend_entry() {
        let mut fig = Figure::new(400, 400);
        fig.draw_points(&[]);
        let svg = fig.render().unwrap();
        assert!(!svg.contains("Selected Points"));
    }

    #[test]
    fn ellipse_outline_is_closed_and_rotated() {
        let points = ellipse_points((1.0, 2.0), 4.0, 2.0, 90.0);
        let first = points[0];
        let last = points[points.len() - 1];
        assert!((first.0 - last.0).abs() < 1e-9 && (first.1 - last.1).abs() < 1e-9);
        // The major axis now points along y.
        assert!((first.0 - 1.0).abs() < 1e-9);
        assert!((first.1 - 6.0).abs() < 1e-9);
    }

    #[test]
    fn strength_colors_follow_sign() {
        let (r, g, b) = strength_rgb(-10.0);
        assert!(b > r && b > g);
        let (r, g, b) = strength_rgb(10.0);
        assert!(r > g && r > b);
    }

    #[test]
    fn strength_colors_saturate_at_ten() {
        let spread = |s: f64| {
            let (r, g, _) = strength_rgb(s);
            i32::from(r) - i32::from(g)
        };
        assert!(spread(5.0) > spread(1.0));
        assert_eq!(strength_rgb(20.0), strength_rgb(10.0));
    }
}
