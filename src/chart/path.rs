use std::fmt::Write as _;

/// Builds SVG path data through the defined points. An undefined point ends
/// the current segment, so missing observations show up as breaks.
pub fn line_path(points: &[Option<(f64, f64)>]) -> String {
    let mut d = String::new();
    let mut pen_down = false;
    for point in points {
        match point {
            Some((x, y)) => {
                let cmd = if pen_down { 'L' } else { 'M' };
                let _ = write!(d, "{cmd}{},{}", num(*x), num(*y));
                pen_down = true;
            }
            None => pen_down = false,
        }
    }
    d
}

/// Area between `y0` and `y1`, one closed shape per run of defined points.
pub fn area_path(points: &[Option<(f64, f64, f64)>]) -> String {
    let mut d = String::new();
    for segment in points.split(|p| p.is_none()) {
        let segment: Vec<(f64, f64, f64)> = segment.iter().flatten().copied().collect();
        if segment.is_empty() {
            continue;
        }
        for (i, (x, _, y1)) in segment.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd}{},{}", num(*x), num(*y1));
        }
        for (x, y0, _) in segment.iter().rev() {
            let _ = write!(d, "L{},{}", num(*x), num(*y0));
        }
        d.push('Z');
    }
    d
}

/// Number of separate runs ("M" commands) in a path.
#[cfg(test)]
pub(crate) fn segment_count(d: &str) -> usize {
    d.matches('M').count()
}

pub(crate) fn num(value: f64) -> String {
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}
