//! SVG horizontal bar chart of the largest price changes.

use std::fmt::Write;

use crate::types::ProductRecord;

const WIDTH: f64 = 800.0;
const LABEL_WIDTH: f64 = 260.0;
const BAR_HEIGHT: f64 = 24.0;
const BAR_GAP: f64 = 8.0;
const MARGIN: f64 = 16.0;
const TITLE_HEIGHT: f64 = 32.0;

const DROP_COLOUR: &str = "#2e7d32";
const RISE_COLOUR: &str = "#c62828";

/// Render one bar per record, top to bottom in the given order.
///
/// Bar length is proportional to `|price_change|`; price drops and price
/// rises use different colours.
pub fn render_top_changes_svg(records: &[&ProductRecord]) -> String {
    let rows = records.len().max(1) as f64;
    let height = TITLE_HEIGHT + MARGIN * 2.0 + rows * (BAR_HEIGHT + BAR_GAP);
    let plot_width = WIDTH - LABEL_WIDTH - MARGIN * 2.0 - 60.0;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="12">"#,
        w = WIDTH,
        h = height
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{x}" y="{y}" font-size="16" font-weight="bold">Top {n} price changes</text>"#,
        x = MARGIN,
        y = MARGIN + 12.0,
        n = records.len()
    );

    if records.is_empty() {
        let _ = writeln!(
            svg,
            r##"<text x="{x}" y="{y}" fill="#666">No data</text>"##,
            x = MARGIN,
            y = TITLE_HEIGHT + MARGIN + BAR_HEIGHT / 2.0
        );
        svg.push_str("</svg>\n");
        return svg;
    }

    let max_abs = records
        .iter()
        .map(|r| r.price_change.abs())
        .fold(0.0_f64, f64::max);

    for (i, record) in records.iter().enumerate() {
        let y = TITLE_HEIGHT + MARGIN + i as f64 * (BAR_HEIGHT + BAR_GAP);
        let length = if max_abs > 0.0 {
            record.price_change.abs() / max_abs * plot_width
        } else {
            0.0
        };
        let colour = if record.price_change < 0.0 { RISE_COLOUR } else { DROP_COLOUR };
        let x0 = MARGIN + LABEL_WIDTH;

        let _ = writeln!(
            svg,
            r#"<text x="{x}" y="{ty}" text-anchor="end">{label}</text>"#,
            x = x0 - 8.0,
            ty = y + BAR_HEIGHT * 0.65,
            label = escape_xml(&truncate(&record.name, 36))
        );
        let _ = writeln!(
            svg,
            r#"<rect x="{x0}" y="{y}" width="{length:.1}" height="{bh}" fill="{colour}"/>"#,
            bh = BAR_HEIGHT
        );
        let _ = writeln!(
            svg,
            r#"<text x="{x:.1}" y="{ty}">{value}</text>"#,
            x = x0 + length + 6.0,
            ty = y + BAR_HEIGHT * 0.65,
            value = format_change(record.price_change)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

fn format_change(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn truncate(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        name.to_string()
    } else {
        let mut short: String = name.chars().take(max_chars - 1).collect();
        short.push('…');
        short
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
