// signalboard/src/colorize.rs

use chrono::{DateTime, Utc};

/// Direction of change across one chart segment. Ties count as rising.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
    /// Single isolated point; no comparison possible.
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: DateTime<Utc>,
    pub x1: DateTime<Utc>,
    pub y0: f64,
    pub y1: f64,
    pub trend: Trend,
}

/// Assign a trend to every consecutive pair of points. A series of n points
/// yields n-1 segments; one point yields a single degenerate Neutral
/// segment; an empty series yields nothing. Pure function, no side effects.
pub fn colorize(xs: &[DateTime<Utc>], ys: &[f64]) -> Vec<Segment> {
    debug_assert_eq!(xs.len(), ys.len());
    let n = ys.len().min(xs.len());

    if n == 1 {
        return vec![Segment {
            x0: xs[0],
            x1: xs[0],
            y0: ys[0],
            y1: ys[0],
            trend: Trend::Neutral,
        }];
    }

    let mut out = Vec::with_capacity(n.saturating_sub(1));
    for i in 1..n {
        let trend = if ys[i] >= ys[i - 1] {
            Trend::Rising
        } else {
            Trend::Falling
        };
        out.push(Segment {
            x0: xs[i - 1],
            x1: xs[i],
            y0: ys[i - 1],
            y1: ys[i],
            trend,
        });
    }
    out
}
