use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use log::warn;

use super::page::{html_escape, Page};
use super::{night_filename, ReportOptions, SUMMARY_FILE};

const WEEKDAYS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Parse a `YYYYMMDD` night label.
pub fn parse_night(night: &str) -> Option<NaiveDate> {
    if night.len() != 8 {
        return None;
    }
    NaiveDate::parse_from_str(night, "%Y%m%d").ok()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(31, |d| d.day())
}

/// One month as a table; observed days link to their night page.
fn render_month(year: i32, month: u32, observed: &BTreeMap<NaiveDate, &str>) -> String {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return String::new();
    };
    let offset = first.weekday().num_days_from_sunday() as usize;
    let n_days = days_in_month(year, month) as usize;

    let mut cells: Vec<String> = vec!["<td></td>".to_string(); offset];
    for day in 1..=n_days {
        let date = first + chrono::Days::new(day as u64 - 1);
        let cell = match observed.get(&date) {
            Some(night) => format!(
                r#"<td class="observed"><a href="{}" title="Night {}">{day}</a></td>"#,
                night_filename(night),
                html_escape(night)
            ),
            None => format!("<td>{day}</td>"),
        };
        cells.push(cell);
    }
    while cells.len() % 7 != 0 {
        cells.push("<td></td>".to_string());
    }

    let header: String = WEEKDAYS.iter().map(|d| format!("<th>{d}</th>")).collect();
    let rows: String = cells
        .chunks(7)
        .map(|week| format!("<tr>{}</tr>", week.concat()))
        .collect();
    format!(
        r#"<table class="month"><caption>{} {year}</caption><thead><tr>{header}</tr></thead><tbody>{rows}</tbody></table>"#,
        MONTHS[(month - 1) as usize]
    )
}

/// Render the calendar for every year touched by an observed night.
pub fn render(nights: &[String], opts: &ReportOptions) -> String {
    let mut observed: BTreeMap<NaiveDate, &str> = BTreeMap::new();
    for night in nights {
        match parse_night(night) {
            Some(date) => {
                observed.insert(date, night.as_str());
            }
            None => warn!("Night {night} is not YYYYMMDD; left off the calendar"),
        }
    }

    let years: BTreeSet<i32> = observed.keys().map(|d| d.year()).collect();
    let mut body = String::new();
    for year in &years {
        body.push_str(&format!("<h2>{year}</h2>\n<div class=\"calendar\">"));
        for month in 1..=12 {
            body.push_str(&render_month(*year, month, &observed));
        }
        body.push_str("</div>\n");
    }
    if years.is_empty() {
        body.push_str("<p>No observed nights.</p>");
    }

    Page::new(format!("{} - Calendar", opts.title))
        .link(SUMMARY_FILE, "Summary Page")
        .section("<h1>Observing Calendar</h1>")
        .section(body)
        .render()
}
