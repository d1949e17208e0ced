/// Plot layer: chart objects rendered to inline SVG.
///
/// ```text
///   stats / data ──► charts::*  ──► Figure ──► svg::render ──► <svg>…</svg>
/// ```
pub mod charts;
mod svg;

use crate::color::Color;

// ---------------------------------------------------------------------------
// Figure – a chart object independent of rendering
// ---------------------------------------------------------------------------

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mark {
    /// Circles of the given pixel radius.
    Circle { radius: f64 },
    /// Polyline of the given pixel stroke width.
    Line { width: f64 },
    /// Vertical bars from y = 0, `width` in data units, centered on x.
    Bars { width: f64 },
}

/// One set of points drawn the same way.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Legend label; unnamed series are not listed in the legend.
    pub name: Option<String>,
    pub color: Color,
    pub points: Vec<[f64; 2]>,
    pub mark: Mark,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub x_label: String,
    pub y_label: String,
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
    /// When set, x positions `0..n` are labelled with these names.
    pub x_categories: Vec<String>,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Figure {
            title: title.into(),
            width,
            height,
            x_label: String::new(),
            y_label: String::new(),
            x_range: None,
            y_range: None,
            x_categories: Vec::new(),
            series: Vec::new(),
        }
    }

    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = label.into();
        self
    }

    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = label.into();
        self
    }

    pub fn x_range(mut self, lo: f64, hi: f64) -> Self {
        self.x_range = Some((lo, hi));
        self
    }

    pub fn y_range(mut self, lo: f64, hi: f64) -> Self {
        self.y_range = Some((lo, hi));
        self
    }

    pub fn categories(mut self, names: Vec<String>) -> Self {
        self.x_categories = names;
        self
    }

    pub fn scatter(self, points: Vec<[f64; 2]>, color: Color, radius: f64) -> Self {
        self.push(points, color, Mark::Circle { radius })
    }

    pub fn line(self, points: Vec<[f64; 2]>, color: Color, width: f64) -> Self {
        self.push(points, color, Mark::Line { width })
    }

    pub fn bars(self, points: Vec<[f64; 2]>, color: Color, width: f64) -> Self {
        self.push(points, color, Mark::Bars { width })
    }

    /// Name the most recently added series for the legend.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let Some(last) = self.series.last_mut() {
            last.name = Some(name.into());
        }
        self
    }

    fn push(mut self, points: Vec<[f64; 2]>, color: Color, mark: Mark) -> Self {
        self.series.push(Series {
            name: None,
            color,
            points,
            mark,
        });
        self
    }

    /// Whether any series holds a finite point.
    pub fn has_data(&self) -> bool {
        self.series
            .iter()
            .flat_map(|s| &s.points)
            .any(|p| p[0].is_finite() && p[1].is_finite())
    }

    /// Render as a standalone inline `<svg>` element.
    pub fn render_svg(&self) -> String {
        svg::render(self)
    }
}

// ---------------------------------------------------------------------------
// Axis ticks
// ---------------------------------------------------------------------------

/// Round a positive step to 1, 2 or 5 × 10^k.
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let residual = raw / magnitude;
    let nice = if residual <= 1.0 {
        1.0
    } else if residual <= 2.0 {
        2.0
    } else if residual <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Roughly `target` evenly spaced round tick positions within `[lo, hi]`.
/// Returns the positions and the step between them.
pub fn nice_ticks(lo: f64, hi: f64, target: usize) -> (Vec<f64>, f64) {
    if !(lo.is_finite() && hi.is_finite()) || hi <= lo || target == 0 {
        return (Vec::new(), 0.0);
    }
    let step = nice_step((hi - lo) / target as f64);
    let first = (lo / step).ceil();
    let ticks = (0..=target * 4)
        .map(|i| (first + i as f64) * step)
        .take_while(|t| *t <= hi + step * 1e-9)
        .map(|t| if t.abs() < step * 1e-9 { 0.0 } else { t })
        .collect();
    (ticks, step)
}

/// Label for a tick, with as many decimals as the step needs.
pub fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step > 0.0 && step < 1.0 {
        (-step.log10().floor()).clamp(0.0, 6.0) as usize
    } else {
        0
    };
    format!("{value:.decimals$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_are_round_numbers() {
        let (ticks, step) = nice_ticks(0.0, 360.0, 5);
        assert_eq!(step, 100.0);
        assert_eq!(ticks, vec![0.0, 100.0, 200.0, 300.0]);

        let (ticks, step) = nice_ticks(-0.1, 0.8, 5);
        assert!((step - 0.2).abs() < 1e-12);
        assert_eq!(ticks.len(), 5);
        assert_eq!(ticks[0], 0.0);
    }

    #[test]
    fn degenerate_tick_range_is_empty() {
        assert!(nice_ticks(1.0, 1.0, 5).0.is_empty());
        assert!(nice_ticks(f64::NAN, 1.0, 5).0.is_empty());
    }

    #[test]
    fn tick_labels_match_step() {
        assert_eq!(format_tick(200.0, 100.0), "200");
        assert_eq!(format_tick(0.4, 0.2), "0.4");
        assert_eq!(format_tick(1.25, 0.05), "1.25");
    }

    #[test]
    fn builder_names_last_series() {
        let fig = Figure::new("t", 100, 100)
            .scatter(vec![[0.0, 1.0]], Color::RED, 2.0)
            .line(vec![[0.0, 1.0], [1.0, 2.0]], Color::GRAY, 1.0)
            .named("trend");
        assert_eq!(fig.series.len(), 2);
        assert_eq!(fig.series[0].name, None);
        assert_eq!(fig.series[1].name.as_deref(), Some("trend"));
        assert!(fig.has_data());
    }

    #[test]
    fn non_finite_points_are_not_data() {
        let fig = Figure::new("t", 100, 100).scatter(vec![[f64::NAN, 1.0]], Color::RED, 2.0);
        assert!(!fig.has_data());
    }
}
