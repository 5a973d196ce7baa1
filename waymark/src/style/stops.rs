use crate::style::StyleValue;

/// Zoom-dependent style value, given as a sorted list of `(zoom, value)` pairs.
///
/// Numbers and colors are interpolated linearly between the stops, other values change stepwise. Before the first
/// stop and after the last one the value of the closest stop is used.
#[derive(Debug, Clone, PartialEq)]
pub struct Stops {
    frames: Vec<(f64, StyleValue)>,
}

impl Stops {
    /// Creates a new stops list. Returns `None` if the list is empty. Frames are sorted by zoom.
    pub fn new(mut frames: Vec<(f64, StyleValue)>) -> Option<Self> {
        if frames.is_empty() || frames.iter().any(|(zoom, _)| !zoom.is_finite()) {
            return None;
        }

        frames.sort_by(|a, b| a.0.total_cmp(&b.0));
        Some(Self { frames })
    }

    /// Value of the stops at the given zoom.
    pub fn evaluate(&self, zoom: f64) -> StyleValue {
        let upper = self.frames.partition_point(|(z, _)| *z <= zoom);
        if upper == 0 {
            return self.frames[0].1.clone();
        }
        if upper == self.frames.len() {
            return self.frames[upper - 1].1.clone();
        }

        let (z0, v0) = &self.frames[upper - 1];
        let (z1, v1) = &self.frames[upper];
        let k = (zoom - z0) / (z1 - z0);

        match (v0, v1) {
            (StyleValue::Number(a), StyleValue::Number(b)) => StyleValue::Number(a + (b - a) * k),
            (StyleValue::Color(a), StyleValue::Color(b)) => StyleValue::Color(a.lerp(*b, k)),
            _ => v0.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;
    use approx::assert_abs_diff_eq;

    fn number(stops: &Stops, zoom: f64) -> f64 {
        match stops.evaluate(zoom) {
            StyleValue::Number(v) => v,
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn numbers_are_interpolated() {
        let stops = Stops::new(vec![
            (16.0, StyleValue::Number(8.0)),
            (10.0, StyleValue::Number(2.0)),
        ])
        .unwrap();

        assert_abs_diff_eq!(number(&stops, 5.0), 2.0);
        assert_abs_diff_eq!(number(&stops, 10.0), 2.0);
        assert_abs_diff_eq!(number(&stops, 13.0), 5.0);
        assert_abs_diff_eq!(number(&stops, 16.0), 8.0);
        assert_abs_diff_eq!(number(&stops, 20.0), 8.0);
    }

    #[test]
    fn colors_are_interpolated() {
        let stops = Stops::new(vec![
            (0.0, StyleValue::Color(Color::BLACK)),
            (10.0, StyleValue::Color(Color::WHITE)),
        ])
        .unwrap();

        assert_eq!(
            stops.evaluate(5.0),
            StyleValue::Color(Color::rgba(128, 128, 128, 255))
        );
    }

    #[test]
    fn other_values_change_stepwise() {
        let stops = Stops::new(vec![
            (0.0, StyleValue::Bool(false)),
            (10.0, StyleValue::Bool(true)),
        ])
        .unwrap();

        assert_eq!(stops.evaluate(9.9), StyleValue::Bool(false));
        assert_eq!(stops.evaluate(10.0), StyleValue::Bool(true));
    }

    #[test]
    fn empty_stops_are_rejected() {
        assert!(Stops::new(vec![]).is_none());
        assert!(Stops::new(vec![(f64::NAN, StyleValue::Number(1.0))]).is_none());
    }
}
