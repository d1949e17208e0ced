use super::page::{data_table, fmt_percent, html_escape, key_value_table, plot_grid, Page};
use super::{night_filename, ReportOptions, SurveyData, CALENDAR_FILE, SUMMARY_FILE};
use crate::color::ColorMap;
use crate::error::{QaError, Result};
use crate::plot::charts;
use crate::stats::{self, NightSummary};

/// Render the summary page. Fails when there are no exposures, since the
/// page is labelled by the last night observed.
pub fn render(data: &SurveyData, nights: &[NightSummary], opts: &ReportOptions) -> Result<String> {
    let survey = stats::summarize_survey(&data.exposures, &data.tiles);
    let last_night = survey.last_night.clone().ok_or(QaError::NoExposures)?;

    let overview = key_value_table(&[
        ("Exposures", survey.n_exposures.to_string()),
        ("Nights", survey.n_nights.to_string()),
        ("Tiles in footprint", survey.n_tiles_total.to_string()),
        ("Tiles observed", survey.n_tiles_observed.to_string()),
        ("Completion", fmt_percent(survey.completion)),
        (
            "Total exposure time",
            format!("{:.1} h", survey.total_exptime_hours),
        ),
    ]);

    let programs = stats::program_completion(&data.exposures, &data.tiles);
    let program_rows: Vec<Vec<String>> = programs
        .iter()
        .map(|p| {
            vec![
                p.program.clone(),
                p.n_tiles.to_string(),
                p.n_observed.to_string(),
                fmt_percent(p.completion),
            ]
        })
        .collect();
    let program_table = data_table(&["Program", "Tiles", "Observed", "Completion"], &program_rows);

    let color_map = ColorMap::new(&stats::tile_programs(&data.tiles));
    let overall = stats::survey_progress(&data.exposures, &data.tiles, None);
    let per_program: Vec<(String, Vec<_>)> = programs
        .iter()
        .map(|p| {
            let progress =
                stats::survey_progress(&data.exposures, &data.tiles, Some(p.program.as_str()));
            (p.program.clone(), progress)
        })
        .collect();

    let observed = stats::unique_tiles(&data.exposures);
    let plots = plot_grid(&[
        charts::sky_plot(&data.tiles, &observed),
        charts::progress_plot(&overall, &per_program, &color_map),
        charts::exposures_per_night_plot(nights),
        charts::hour_angle_histogram(&data.exposures),
    ]);

    let night_links: String = nights
        .iter()
        .map(|n| {
            format!(
                r#"<a href="{}">{}</a>"#,
                html_escape(&night_filename(&n.night)),
                html_escape(&n.night)
            )
        })
        .collect::<Vec<_>>()
        .join(" ");

    let night_rows: Vec<Vec<String>> = nights
        .iter()
        .rev()
        .map(|n| {
            vec![
                n.night.clone(),
                n.n_exposures.to_string(),
                n.n_tiles.to_string(),
                n.n_new_tiles.to_string(),
                format!("{:.1}", n.total_exptime / 3600.0),
            ]
        })
        .collect();

    let mut page = Page::new(opts.title.clone()).link(SUMMARY_FILE, "Summary");
    if opts.calendar {
        page = page.link(CALENDAR_FILE, "Calendar");
    }
    let html = page
        .section(format!(
            "<h1>{}</h1>\n<p>Through night {}</p>",
            html_escape(&opts.title),
            html_escape(&last_night)
        ))
        .section(overview)
        .section(plots)
        .section(format!("<h2>Completion by program</h2>\n{program_table}"))
        .section(format!(
            "<h2>Nights</h2>\n<p class=\"night-list\">{night_links}</p>\n{}",
            data_table(
                &["Night", "Exposures", "Tiles", "New tiles", "Exposure time [h]"],
                &night_rows
            )
        ))
        .render();
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tests::{exposure, tile};

    #[test]
    fn quoted_night_cannot_break_out_of_links() {
        let data = SurveyData {
            exposures: vec![exposure(r#"N"1"#, 1, 58819.1)],
            tiles: vec![tile(1, Some("DARK"))],
        };
        let nights = stats::night_summaries(&data.exposures);
        let html = render(&data, &nights, &ReportOptions::default()).unwrap();

        assert!(html.contains(r#"<a href="night-N_1.html">N&quot;1</a>"#));
        assert!(!html.contains(r#"N"1"#));
    }

    #[test]
    fn empty_survey_has_no_summary() {
        let data = SurveyData::default();
        let err = render(&data, &[], &ReportOptions::default()).unwrap_err();
        assert!(matches!(err, QaError::NoExposures));
    }
}
