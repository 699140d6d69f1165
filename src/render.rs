// signalboard/src/render.rs
//
// Presentation glue: turns colorized segments into inline SVG and composes
// the full dashboard page. The page refreshes itself via a header meta tag
// at the configured interval, which re-enters the render loop server-side.

use chrono::{DateTime, Utc};

use crate::colorize::{colorize, Segment, Trend};
use crate::config::DashboardConfig;
use crate::history::HistoryTable;
use crate::schema::{self, Asset, ASSETS, CRITERIA};

const RISING_COLOR: &str = "#2ecc71";
const FALLING_COLOR: &str = "#e74c3c";
const NEUTRAL_COLOR: &str = "#3b82f6";

const PAD: f64 = 4.0;

fn trend_color(trend: Trend) -> &'static str {
    match trend {
        Trend::Rising => RISING_COLOR,
        Trend::Falling => FALLING_COLOR,
        Trend::Neutral => NEUTRAL_COLOR,
    }
}

/// One line chart as a self-contained `<svg>`, one stroke per colorized
/// segment. An empty series renders an empty chart; a single point renders
/// a neutral dot.
pub fn chart_svg(
    xs: &[DateTime<Utc>],
    ys: &[f64],
    width: f64,
    height: f64,
    stroke: f64,
) -> String {
    let mut body = String::new();
    for seg in colorize(xs, ys) {
        body.push_str(&segment_svg(&seg, xs, ys, width, height, stroke));
    }
    format!(
        "<svg viewBox=\"0 0 {width:.0} {height:.0}\" width=\"100%\" height=\"{height:.0}\" \
         preserveAspectRatio=\"none\" xmlns=\"http://www.w3.org/2000/svg\">{body}</svg>"
    )
}

fn segment_svg(
    seg: &Segment,
    xs: &[DateTime<Utc>],
    ys: &[f64],
    width: f64,
    height: f64,
    stroke: f64,
) -> String {
    let color = trend_color(seg.trend);
    let (x0, y0) = project(seg.x0, seg.y0, xs, ys, width, height);
    if seg.trend == Trend::Neutral {
        return format!(
            "<circle cx=\"{x0:.1}\" cy=\"{y0:.1}\" r=\"{r:.1}\" fill=\"{color}\"/>",
            r = stroke * 1.5
        );
    }
    let (x1, y1) = project(seg.x1, seg.y1, xs, ys, width, height);
    format!(
        "<line x1=\"{x0:.1}\" y1=\"{y0:.1}\" x2=\"{x1:.1}\" y2=\"{y1:.1}\" \
         stroke=\"{color}\" stroke-width=\"{stroke:.1}\" stroke-linecap=\"round\"/>"
    )
}

/// Map a data point into the chart pixel box, y-axis auto-scaled to the
/// series with a degenerate-range guard so flat lines stay visible.
fn project(
    x: DateTime<Utc>,
    y: f64,
    xs: &[DateTime<Utc>],
    ys: &[f64],
    width: f64,
    height: f64,
) -> (f64, f64) {
    let (t0, t1) = match (xs.first(), xs.last()) {
        (Some(a), Some(b)) => (*a, *b),
        _ => return (PAD, height / 2.0),
    };
    let span_ms = (t1 - t0).num_milliseconds().max(1) as f64;
    let fx = (x - t0).num_milliseconds() as f64 / span_ms;

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in ys {
        lo = lo.min(*v);
        hi = hi.max(*v);
    }
    if !(hi > lo) {
        lo -= 1.0;
        hi += 1.0;
    }
    let fy = (y - lo) / (hi - lo);

    (
        PAD + fx * (width - 2.0 * PAD),
        height - PAD - fy * (height - 2.0 * PAD),
    )
}

fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn labelled_row(label: &str, svg: &str) -> String {
    format!(
        "<div class=\"row\"><div class=\"label\">{label}</div>\
         <div class=\"chart\">{svg}</div></div>"
    )
}

fn asset_rows(table: &HistoryTable, asset: &Asset) -> String {
    let name = capitalize(asset.id);
    let mut out = String::new();
    for (column, kind) in [
        (schema::price_column(asset), "price"),
        (schema::volume_column(asset), "volume"),
    ] {
        if let Some((xs, ys)) = table.series(&column) {
            let label = format!("<b>{name} {kind}</b> ({})", asset.symbol);
            out.push_str(&labelled_row(&label, &chart_svg(&xs, &ys, 720.0, 120.0, 2.0)));
        }
    }
    out
}

/// The full dashboard page: title, aggregate trace of the 12 criteria,
/// one labelled chart per criterion, then price and volume per asset.
pub fn page_html(table: &HistoryTable, cfg: &DashboardConfig) -> String {
    let (agg_xs, agg_ys) = table.criteria_mean();
    let aggregate = chart_svg(&agg_xs, &agg_ys, 960.0, 320.0, 3.0);

    let mut criteria_rows = String::new();
    for metric in &CRITERIA {
        if let Some((xs, ys)) = table.series(metric.name) {
            let label = format!("<b>{}</b> ({})", metric.name, metric.code);
            criteria_rows.push_str(&labelled_row(&label, &chart_svg(&xs, &ys, 720.0, 120.0, 2.0)));
        }
    }

    let mut crypto_rows = String::new();
    for asset in &ASSETS {
        crypto_rows.push_str(&asset_rows(table, asset));
    }

    let updated = table
        .newest_ts()
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8"/>
  <meta http-equiv="refresh" content="{interval}"/>
  <title>Signalboard — 12-Kriterien Live Dashboard</title>
  <style>
    body {{ font-family: system-ui, sans-serif; padding: 24px; background: #0f1320; color: #e8f0ff; margin: 0 auto; max-width: 1000px; }}
    h1 {{ font-size: 1.4rem; }}
    h2 {{ font-size: 1.05rem; margin: 24px 0 8px; color: #9fb3d9; }}
    .card {{ background: #151a2a; padding: 16px; border-radius: 8px; border: 1px solid #27324a; margin-bottom: 12px; }}
    .row {{ display: flex; align-items: center; gap: 12px; margin-bottom: 8px; }}
    .label {{ flex: 1; min-width: 180px; }}
    .chart {{ flex: 4; background: #151a2a; border: 1px solid #27324a; border-radius: 6px; }}
    footer {{ margin-top: 24px; color: #66779b; font-size: 0.85rem; }}
  </style>
</head>
<body>
  <h1>12-Kriterien Live Dashboard 🛡️</h1>
  <h2>Gesamtspur aller 12 Kriterien (aggregiert)</h2>
  <div class="card">{aggregate}</div>
  <h2>Kriterien</h2>
  {criteria_rows}
  <h2>Kryptowährungen</h2>
  {crypto_rows}
  <footer>last update {updated} · {rows} rows retained · refreshes every {interval}s</footer>
</body>
</html>"#,
        interval = cfg.refresh_interval_secs,
        rows = table.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn chart_colors_follow_the_segments() {
        let xs: Vec<_> = (0..3).map(ts).collect();
        let svg = chart_svg(&xs, &[10.0, 8.0, 8.0], 720.0, 120.0, 2.0);
        assert_eq!(svg.matches("<line").count(), 2);
        assert!(svg.contains(FALLING_COLOR));
        assert!(svg.contains(RISING_COLOR));
    }

    #[test]
    fn single_point_renders_a_neutral_dot() {
        let svg = chart_svg(&[ts(0)], &[5.0], 720.0, 120.0, 2.0);
        assert!(svg.contains("<circle"));
        assert!(svg.contains(NEUTRAL_COLOR));
        assert_eq!(svg.matches("<line").count(), 0);
    }

    #[test]
    fn empty_series_renders_an_empty_chart() {
        let svg = chart_svg(&[], &[], 720.0, 120.0, 2.0);
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("<line"));
        assert!(!svg.contains("<circle"));
    }

    #[test]
    fn flat_series_projects_inside_the_box() {
        let xs: Vec<_> = (0..2).map(ts).collect();
        let (_, y) = project(xs[0], 7.0, &xs, &[7.0, 7.0], 720.0, 120.0);
        assert!(y.is_finite());
        assert!((0.0..=120.0).contains(&y));
    }

    #[test]
    fn page_contains_one_chart_per_series_plus_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = DashboardConfig::default();
        cfg.history_path = dir.path().join("history.csv");
        cfg.init_window = 10;
        let mut rng = StdRng::seed_from_u64(17);
        let table = crate::history::HistoryTable::load_or_init(&cfg, &mut rng, ts(1_700_000_000));

        let html = page_html(&table, &cfg);
        // 1 aggregate + 12 criteria + 3 assets x (price, volume)
        assert_eq!(html.matches("<svg").count(), 19);
        assert!(html.contains("Marktplatzierung"));
        assert!(html.contains("Bitcoin price"));
        assert!(html.contains("http-equiv=\"refresh\" content=\"5\""));
    }
}
