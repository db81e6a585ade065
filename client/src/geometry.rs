use routesketch_shared::{LngLat, Stroke};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: ScreenPoint) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenBox {
    pub min: ScreenPoint,
    pub max: ScreenPoint,
}

impl ScreenBox {
    pub fn around(center: ScreenPoint, half: f64) -> Self {
        Self {
            min: ScreenPoint::new(center.x - half, center.y - half),
            max: ScreenPoint::new(center.x + half, center.y + half),
        }
    }

    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

pub fn closest_on_segment(p: ScreenPoint, a: ScreenPoint, b: ScreenPoint) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq < f64::EPSILON {
        return 0.0;
    }
    (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
}

pub fn distance_to_segment(p: ScreenPoint, a: ScreenPoint, b: ScreenPoint) -> f64 {
    let t = closest_on_segment(p, a, b);
    let proj = ScreenPoint::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
    p.distance_to(proj)
}

pub fn nearest_point_on_strokes(
    strokes: &[Stroke],
    target: ScreenPoint,
    project: impl Fn(LngLat) -> ScreenPoint,
) -> Option<LngLat> {
    let mut best: Option<(f64, LngLat)> = None;
    let mut consider = |distance: f64, point: LngLat| {
        if best.map_or(true, |(current, _)| distance < current) {
            best = Some((distance, point));
        }
    };
    for stroke in strokes {
        let projected = stroke
            .points
            .iter()
            .map(|point| (*point, project(*point)))
            .collect::<Vec<_>>();
        if let [(point, screen)] = projected.as_slice() {
            consider(target.distance_to(*screen), *point);
            continue;
        }
        for window in projected.windows(2) {
            let (start, start_screen) = window[0];
            let (end, end_screen) = window[1];
            let t = closest_on_segment(target, start_screen, end_screen);
            let distance = distance_to_segment(target, start_screen, end_screen);
            consider(distance, start.lerp(end, t));
        }
    }
    best.map(|(_, point)| point)
}
