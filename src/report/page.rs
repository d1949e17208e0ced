use crate::plot::Figure;

/// A self-contained HTML page: inline CSS, no external assets.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub title: String,
    /// Navigation links as `(href, label)`.
    pub nav: Vec<(String, String)>,
    /// Pre-rendered HTML fragments, in order.
    pub sections: Vec<String>,
}

impl Page {
    pub fn new(title: impl Into<String>) -> Self {
        Page {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn link(mut self, href: impl Into<String>, label: impl Into<String>) -> Self {
        self.nav.push((href.into(), label.into()));
        self
    }

    pub fn section(mut self, html: impl Into<String>) -> Self {
        self.sections.push(html.into());
        self
    }

    pub fn render(&self) -> String {
        let nav: String = self
            .nav
            .iter()
            .map(|(href, label)| {
                format!(
                    r#"<a class="nav-link" href="{}">{}</a>"#,
                    html_escape(href),
                    html_escape(label)
                )
            })
            .collect::<Vec<_>>()
            .join("\n        ");

        format!(
            r#"<!DOCTYPE html>
<html lang="en-US">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
    <nav>
        {nav}
    </nav>
{sections}
    <footer>Generated by surveyqa {version}</footer>
    </div>
</body>
</html>
"#,
            title = html_escape(&self.title),
            css = inline_css(),
            nav = nav,
            sections = self.sections.join("\n"),
            version = env!("CARGO_PKG_VERSION"),
        )
    }
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Two-column table of label / value pairs.
pub fn key_value_table(rows: &[(&str, String)]) -> String {
    let body: String = rows
        .iter()
        .map(|(k, v)| {
            format!(
                "<tr><th>{}</th><td>{}</td></tr>",
                html_escape(k),
                html_escape(v)
            )
        })
        .collect();
    format!(r#"<table class="kv">{body}</table>"#)
}

/// Table with a header row. Cells are escaped.
pub fn data_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let head: String = headers
        .iter()
        .map(|h| format!("<th>{}</th>", html_escape(h)))
        .collect();
    let body: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|c| format!("<td>{}</td>", html_escape(c)))
                .collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();
    format!(r#"<table class="data"><thead><tr>{head}</tr></thead><tbody>{body}</tbody></table>"#)
}

/// Figures laid out side by side, wrapping as the window narrows.
pub fn plot_grid(figures: &[Figure]) -> String {
    let cells: String = figures
        .iter()
        .map(|f| format!(r#"<div class="plot">{}</div>"#, f.render_svg()))
        .collect();
    format!(r#"<div class="plots">{cells}</div>"#)
}

/// Format an optional number, `-` when absent.
pub fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.decimals$}"))
}

/// Percentage with one decimal.
pub fn fmt_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Inline CSS styles
fn inline_css() -> &'static str {
    r#"
* { box-sizing: border-box; }
body {
    font-family: system-ui, -apple-system, 'Segoe UI', sans-serif;
    line-height: 1.5;
    color: #111827;
    background: #ffffff;
    margin: 0;
}
.container { max-width: 1300px; margin: 0 auto; padding: 1.5rem; }
nav { margin-bottom: 1rem; }
.nav-link {
    display: inline-block;
    margin-right: 0.5rem;
    padding: 0.25rem 0.75rem;
    border: 1px solid #d1d5db;
    border-radius: 4px;
    text-decoration: none;
    color: #1f2937;
}
h1 { margin: 0.5rem 0; }
h2 { margin-top: 2rem; border-bottom: 1px solid #e5e7eb; }
table { border-collapse: collapse; margin: 0.5rem 0 1rem; font-size: 0.9rem; }
th, td { padding: 0.25rem 0.75rem; border-bottom: 1px solid #e5e7eb; text-align: left; }
table.data td { font-variant-numeric: tabular-nums; }
.plots { display: flex; flex-wrap: wrap; gap: 1rem; }
.plot svg { border: 1px solid #f3f4f6; }
.qa-plot text { font-size: 11px; fill: #374151; }
.qa-plot .plot-title { font-size: 13px; font-weight: 600; }
.night-list a { margin-right: 0.5rem; }
.calendar { display: flex; flex-wrap: wrap; gap: 1.5rem; }
.month caption { font-weight: 600; }
.month td { text-align: center; width: 2rem; }
.month td.observed { background: #15803d; opacity: 0.7; border-radius: 10px; }
.month td.observed a { color: #ffffff; text-decoration: none; }
footer { margin-top: 3rem; color: #6b7280; font-size: 0.8rem; }
"#
}
