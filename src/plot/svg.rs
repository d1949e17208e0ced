use super::{format_tick, nice_ticks, Figure, Mark};

const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 15.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 45.0;
const TICK_TARGET: usize = 5;
const MAX_CATEGORY_LABELS: usize = 10;

/// Escape text for use inside SVG elements and attributes.
pub(crate) fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Data bounds of one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Span {
    lo: f64,
    hi: f64,
}

impl Span {
    /// Auto range: min..max of the values padded by 5 %, widened by ±0.5
    /// when degenerate, `0..1` when there are no values.
    fn fit(values: impl Iterator<Item = f64>) -> Span {
        let (lo, hi) = values
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if !lo.is_finite() {
            return Span { lo: 0.0, hi: 1.0 };
        }
        Span::fixed(lo, hi).padded()
    }

    fn fixed(lo: f64, hi: f64) -> Span {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        if hi - lo < f64::EPSILON * lo.abs().max(1.0) {
            Span {
                lo: lo - 0.5,
                hi: hi + 0.5,
            }
        } else {
            Span { lo, hi }
        }
    }

    fn padded(self) -> Span {
        let pad = (self.hi - self.lo) * 0.05;
        Span {
            lo: self.lo - pad,
            hi: self.hi + pad,
        }
    }

    fn fraction(&self, v: f64) -> f64 {
        (v - self.lo) / (self.hi - self.lo)
    }
}

struct Frame {
    x: Span,
    y: Span,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn px(&self, x: f64) -> f64 {
        self.left + self.x.fraction(x) * self.width
    }

    fn py(&self, y: f64) -> f64 {
        self.top + self.height - self.y.fraction(y) * self.height
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        x.is_finite()
            && y.is_finite()
            && x >= self.x.lo
            && x <= self.x.hi
            && y >= self.y.lo
            && y <= self.y.hi
    }
}

fn x_span(fig: &Figure) -> Span {
    if let Some((lo, hi)) = fig.x_range {
        return Span::fixed(lo, hi);
    }
    if !fig.x_categories.is_empty() {
        return Span {
            lo: -0.5,
            hi: fig.x_categories.len() as f64 - 0.5,
        };
    }
    Span::fit(fig.series.iter().flat_map(|s| {
        let half = match s.mark {
            Mark::Bars { width } => width / 2.0,
            _ => 0.0,
        };
        s.points
            .iter()
            .flat_map(move |p| [p[0] - half, p[0] + half])
    }))
}

fn y_span(fig: &Figure) -> Span {
    if let Some((lo, hi)) = fig.y_range {
        return Span::fixed(lo, hi);
    }
    let has_bars = fig
        .series
        .iter()
        .any(|s| matches!(s.mark, Mark::Bars { .. }));
    let values = fig.series.iter().flat_map(|s| s.points.iter().map(|p| p[1]));
    let span = if has_bars {
        Span::fit(values.chain(std::iter::once(0.0)))
    } else {
        Span::fit(values)
    };
    // Bars grow from zero; keep the baseline on the frame.
    if has_bars && span.lo < 0.0 && fig.series.iter().all(|s| s.points.iter().all(|p| p[1] >= 0.0)) {
        Span { lo: 0.0, ..span }
    } else {
        span
    }
}

/// Render a figure as an inline SVG element.
pub(crate) fn render(fig: &Figure) -> String {
    let width = fig.width as f64;
    let height = fig.height as f64;
    let frame = Frame {
        x: x_span(fig),
        y: y_span(fig),
        left: MARGIN_LEFT,
        top: MARGIN_TOP,
        width: (width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0),
        height: (height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0),
    };

    let mut out = String::with_capacity(4 * 1024);
    out.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="qa-plot" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="img"><title>{title}</title>"#,
        w = fig.width,
        h = fig.height,
        title = xml_escape(&fig.title),
    ));
    out.push_str(&format!(
        r##"<rect x="0" y="0" width="{w}" height="{h}" fill="#ffffff"/>"##,
        w = fig.width,
        h = fig.height,
    ));
    out.push_str(&format!(
        r#"<text x="{x:.1}" y="18" text-anchor="middle" class="plot-title">{title}</text>"#,
        x = width / 2.0,
        title = xml_escape(&fig.title),
    ));

    render_axes(&mut out, fig, &frame);

    if fig.has_data() {
        for series in &fig.series {
            render_series(&mut out, series, &frame);
        }
        render_legend(&mut out, fig, &frame);
    } else {
        out.push_str(&format!(
            r##"<text x="{x:.1}" y="{y:.1}" text-anchor="middle" fill="#808080">No data</text>"##,
            x = frame.left + frame.width / 2.0,
            y = frame.top + frame.height / 2.0,
        ));
    }

    out.push_str("</svg>");
    out
}

fn render_axes(out: &mut String, fig: &Figure, frame: &Frame) {
    let bottom = frame.top + frame.height;

    // x ticks: categorical labels or numeric ticks
    if fig.x_categories.is_empty() {
        let (ticks, step) = nice_ticks(frame.x.lo, frame.x.hi, TICK_TARGET);
        for t in ticks {
            let x = frame.px(t);
            push_tick_x(out, x, bottom, &format_tick(t, step));
        }
    } else {
        let every = fig.x_categories.len().div_ceil(MAX_CATEGORY_LABELS).max(1);
        for (i, name) in fig.x_categories.iter().enumerate().step_by(every) {
            let x = frame.px(i as f64);
            push_tick_x(out, x, bottom, name);
        }
    }

    let (ticks, step) = nice_ticks(frame.y.lo, frame.y.hi, TICK_TARGET);
    for t in ticks {
        let y = frame.py(t);
        out.push_str(&format!(
            r##"<line x1="{x0:.1}" y1="{y:.1}" x2="{x1:.1}" y2="{y:.1}" stroke="#e5e7eb"/>"##,
            x0 = frame.left,
            x1 = frame.left + frame.width,
        ));
        out.push_str(&format!(
            r#"<text x="{x:.1}" y="{ty:.1}" text-anchor="end" class="tick">{label}</text>"#,
            x = frame.left - 6.0,
            ty = y + 4.0,
            label = xml_escape(&format_tick(t, step)),
        ));
    }

    out.push_str(&format!(
        r##"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="none" stroke="#374151"/>"##,
        x = frame.left,
        y = frame.top,
        w = frame.width,
        h = frame.height,
    ));

    if !fig.x_label.is_empty() {
        out.push_str(&format!(
            r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle" class="axis-label">{label}</text>"#,
            x = frame.left + frame.width / 2.0,
            y = bottom + 36.0,
            label = xml_escape(&fig.x_label),
        ));
    }
    if !fig.y_label.is_empty() {
        let cx = 14.0;
        let cy = frame.top + frame.height / 2.0;
        out.push_str(&format!(
            r#"<text x="{cx:.1}" y="{cy:.1}" text-anchor="middle" transform="rotate(-90 {cx:.1} {cy:.1})" class="axis-label">{label}</text>"#,
            label = xml_escape(&fig.y_label),
        ));
    }
}

fn push_tick_x(out: &mut String, x: f64, bottom: f64, label: &str) {
    out.push_str(&format!(
        r##"<line x1="{x:.1}" y1="{bottom:.1}" x2="{x:.1}" y2="{y2:.1}" stroke="#374151"/>"##,
        y2 = bottom + 5.0,
    ));
    out.push_str(&format!(
        r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle" class="tick">{label}</text>"#,
        y = bottom + 18.0,
        label = xml_escape(label),
    ));
}

fn render_series(out: &mut String, series: &super::Series, frame: &Frame) {
    let color = series.color.to_hex();
    match series.mark {
        Mark::Circle { radius } => {
            out.push_str(&format!(r#"<g fill="{color}">"#));
            for p in series.points.iter().filter(|p| frame.contains(p[0], p[1])) {
                out.push_str(&format!(
                    r#"<circle cx="{x:.1}" cy="{y:.1}" r="{radius}"/>"#,
                    x = frame.px(p[0]),
                    y = frame.py(p[1]),
                ));
            }
            out.push_str("</g>");
        }
        Mark::Line { width } => {
            let coords: Vec<String> = series
                .points
                .iter()
                .filter(|p| frame.contains(p[0], p[1]))
                .map(|p| format!("{:.1},{:.1}", frame.px(p[0]), frame.py(p[1])))
                .collect();
            if coords.len() > 1 {
                out.push_str(&format!(
                    r#"<polyline points="{points}" fill="none" stroke="{color}" stroke-width="{width}"/>"#,
                    points = coords.join(" "),
                ));
            }
        }
        Mark::Bars { width } => {
            let base = frame.py(0.0_f64.clamp(frame.y.lo, frame.y.hi));
            out.push_str(&format!(r#"<g fill="{color}">"#));
            for p in series
                .points
                .iter()
                .filter(|p| p[0].is_finite() && p[1].is_finite())
            {
                let x0 = frame.px((p[0] - width / 2.0).max(frame.x.lo));
                let x1 = frame.px((p[0] + width / 2.0).min(frame.x.hi));
                let top = frame.py(p[1].clamp(frame.y.lo, frame.y.hi));
                let (y, h) = if top <= base {
                    (top, base - top)
                } else {
                    (base, top - base)
                };
                if x1 > x0 {
                    out.push_str(&format!(
                        r#"<rect x="{x0:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}"/>"#,
                        w = x1 - x0,
                    ));
                }
            }
            out.push_str("</g>");
        }
    }
}

fn render_legend(out: &mut String, fig: &Figure, frame: &Frame) {
    let entries: Vec<(&str, String)> = fig
        .series
        .iter()
        .filter_map(|s| s.name.as_deref().map(|n| (n, s.color.to_hex())))
        .collect();
    if entries.is_empty() {
        return;
    }
    let x = frame.left + frame.width - 110.0;
    for (i, (name, color)) in entries.iter().enumerate() {
        let y = frame.top + 8.0 + i as f64 * 14.0;
        out.push_str(&format!(
            r#"<rect x="{x:.1}" y="{y:.1}" width="10" height="10" fill="{color}"/>"#
        ));
        out.push_str(&format!(
            r#"<text x="{tx:.1}" y="{ty:.1}" class="legend">{label}</text>"#,
            tx = x + 14.0,
            ty = y + 9.0,
            label = xml_escape(name),
        ));
    }
}
