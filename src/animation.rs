//! Time-sliced animation clock.
//!
//! Nothing here runs on its own: the engine advances every [`Tween`] from its
//! `tick(dt)` and reads the eased progress back to rebuild piece transforms.

use strum::{Display, EnumIter, EnumString};

/// Progress curve of a tween.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    /// Maps linear progress in `0.0..=1.0` onto the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// A single running animation clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    elapsed: f32,
    duration: f32,
    easing: Easing,
}

impl Tween {
    pub fn new(duration: f32, easing: Easing) -> Self {
        Self { elapsed: 0.0, duration: duration.max(0.0), easing }
    }

    /// A plain delay (linear, progress unused).
    pub fn delay(duration: f32) -> Self {
        Self::new(duration, Easing::Linear)
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
    }

    /// Eased progress; zero-length tweens are complete from the start.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        self.easing.apply(self.elapsed / self.duration)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }
}

/// Linear interpolation between two scalars.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_easing_endpoints() {
        for easing in Easing::iter() {
            assert_eq!(easing.apply(0.0), 0.0, "{easing}");
            assert_eq!(easing.apply(1.0), 1.0, "{easing}");
            assert_eq!(easing.apply(2.0), 1.0, "{easing} should clamp");
        }
        assert_eq!(Easing::EaseInOut.apply(0.5), 0.5);
    }

    #[test]
    fn test_tween_runs_to_completion() {
        let mut tween = Tween::new(0.5, Easing::Linear);
        assert!(!tween.is_finished());
        tween.advance(0.25);
        assert_eq!(tween.progress(), 0.5);
        tween.advance(1.0);
        assert!(tween.is_finished());
        assert_eq!(tween.progress(), 1.0);
    }

    #[test]
    fn test_zero_duration_tween() {
        let tween = Tween::new(0.0, Easing::EaseOut);
        assert!(tween.is_finished());
        assert_eq!(tween.progress(), 1.0);
    }

    #[test]
    fn test_easing_parses_kebab_case() {
        assert_eq!("ease-in-out".parse::<Easing>(), Ok(Easing::EaseInOut));
        assert_eq!(Easing::EaseOut.to_string(), "ease-out");
    }
}
