use std::time::Duration;

use waymark_types::Point2d;

/// Easing curve of a marker position animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EaseType {
    /// Constant speed.
    #[default]
    Linear,
    /// Cubic smoothstep.
    Cubic,
    /// Quintic smootherstep.
    Quint,
    /// Half of a cosine wave.
    Sine,
}

impl EaseType {
    /// Parses the ease type from its name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(Self::Linear),
            "cubic" => Some(Self::Cubic),
            "quint" => Some(Self::Quint),
            "sine" => Some(Self::Sine),
            _ => None,
        }
    }

    /// Maps the animation progress `t` in `[0, 1]` to the interpolation factor.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Cubic => (3.0 - 2.0 * t) * t * t,
            Self::Quint => (6.0 * t * t - 15.0 * t + 10.0) * t * t * t,
            Self::Sine => 0.5 - 0.5 * (std::f64::consts::PI * t).cos(),
        }
    }
}

/// Animation of a point marker moving from one projected position to another.
#[derive(Debug, Clone, PartialEq)]
pub struct Ease {
    start: Point2d,
    end: Point2d,
    duration: Duration,
    elapsed: Duration,
    kind: EaseType,
}

impl Ease {
    /// Creates a new animation.
    pub fn new(start: Point2d, end: Point2d, duration: Duration, kind: EaseType) -> Self {
        Self {
            start,
            end,
            duration,
            elapsed: Duration::ZERO,
            kind,
        }
    }

    /// Target position.
    pub fn end(&self) -> Point2d {
        self.end
    }

    /// Easing curve.
    pub fn kind(&self) -> EaseType {
        self.kind
    }

    /// Advances the animation by `dt` and returns the current position.
    pub fn advance(&mut self, dt: Duration) -> Point2d {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = if self.duration.is_zero() {
            1.0
        } else {
            self.elapsed.as_secs_f64() / self.duration.as_secs_f64()
        };

        self.start + (self.end - self.start) * self.kind.apply(t)
    }

    /// Returns true if the animation reached its target.
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn curves_keep_end_points() {
        for kind in [EaseType::Linear, EaseType::Cubic, EaseType::Quint, EaseType::Sine] {
            assert_abs_diff_eq!(kind.apply(0.0), 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(kind.apply(0.5), 0.5, epsilon = 1e-12);
            assert_abs_diff_eq!(kind.apply(1.0), 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(kind.apply(2.0), 1.0, epsilon = 1e-12);
        }

        assert!(EaseType::Cubic.apply(0.25) < EaseType::Linear.apply(0.25));
    }

    #[test]
    fn from_name() {
        assert_eq!(EaseType::from_name("quint"), Some(EaseType::Quint));
        assert_eq!(EaseType::from_name("bounce"), None);
    }

    #[test]
    fn advance_reaches_target() {
        let mut ease = Ease::new(
            Point2d::new(0.0, 0.0),
            Point2d::new(10.0, 20.0),
            Duration::from_secs(2),
            EaseType::Linear,
        );

        let position = ease.advance(Duration::from_millis(500));
        assert_abs_diff_eq!(position.x, 2.5);
        assert_abs_diff_eq!(position.y, 5.0);
        assert!(!ease.is_finished());

        let position = ease.advance(Duration::from_secs(5));
        assert_abs_diff_eq!(position.x, 10.0);
        assert_abs_diff_eq!(position.y, 20.0);
        assert!(ease.is_finished());
    }

    #[test]
    fn zero_duration_jumps_to_target() {
        let mut ease = Ease::new(
            Point2d::new(0.0, 0.0),
            Point2d::new(1.0, 1.0),
            Duration::ZERO,
            EaseType::Sine,
        );
        assert_eq!(ease.advance(Duration::ZERO), Point2d::new(1.0, 1.0));
        assert!(ease.is_finished());
    }
}
