use crate::geometry::ScreenPoint;

pub const MIN_PIXEL_DISTANCE: f64 = 15.0;

/// The first point of a stroke (`last == None`) is always kept. The bound is
/// inclusive: a sample exactly [`MIN_PIXEL_DISTANCE`] away is accepted.
pub fn should_accept(last: Option<ScreenPoint>, candidate: ScreenPoint) -> bool {
    match last {
        None => true,
        Some(last) => last.distance_to(candidate) >= MIN_PIXEL_DISTANCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: ScreenPoint = ScreenPoint { x: 100.0, y: 100.0 };

    #[test]
    fn first_point_is_always_accepted() {
        assert!(should_accept(None, ORIGIN));
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(should_accept(Some(ORIGIN), ScreenPoint::new(115.0, 100.0)));
        assert!(should_accept(Some(ORIGIN), ScreenPoint::new(109.0, 112.0)));
        assert!(!should_accept(Some(ORIGIN), ScreenPoint::new(114.99, 100.0)));
    }

    #[test]
    fn close_samples_are_rejected_in_every_direction() {
        for step in 0..16 {
            let angle = step as f64 * std::f64::consts::PI / 8.0;
            let near = ScreenPoint::new(100.0 + 14.0 * angle.cos(), 100.0 + 14.0 * angle.sin());
            let far = ScreenPoint::new(100.0 + 16.0 * angle.cos(), 100.0 + 16.0 * angle.sin());
            assert!(!should_accept(Some(ORIGIN), near));
            assert!(should_accept(Some(ORIGIN), far));
        }
    }
}
