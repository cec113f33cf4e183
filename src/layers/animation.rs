use crate::core::geo::LatLng;
use crate::engine::{Camera, CameraTarget};
use std::time::{Duration, Instant};

/// Easing curves for camera moves
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EasingType {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
    Smooth,
}

impl EasingType {
    /// Apply easing function to a normalized time value (0.0 to 1.0)
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingType::Linear => t,
            EasingType::EaseIn => t * t * t,
            EasingType::EaseOut => {
                let t = t - 1.0;
                t * t * t + 1.0
            }
            EasingType::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            // Smooth step (3t^2 - 2t^3)
            EasingType::Smooth => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Camera move from one position to a target over a fixed duration
#[derive(Debug, Clone, PartialEq)]
pub struct FlyToAnimation {
    from: Camera,
    to: Camera,
    started: Instant,
    duration: Duration,
    easing: EasingType,
}

impl FlyToAnimation {
    pub fn new(from: Camera, target: CameraTarget, started: Instant, easing: EasingType) -> Self {
        Self {
            from,
            to: Camera {
                center: target.center,
                zoom: target.zoom,
            },
            started,
            duration: target.duration,
            easing,
        }
    }

    /// Linear progress through the duration, clamped to `[0, 1]`
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    /// Camera position at `now`
    pub fn sample(&self, now: Instant) -> Camera {
        let progress = self.progress(now);
        if progress >= 1.0 {
            return self.to;
        }

        let t = self.easing.apply(progress);
        Camera {
            center: LatLng::lerp(&self.from.center, &self.to.center, t),
            zoom: self.from.zoom + (self.to.zoom - self.from.zoom) * t,
        }
    }
}
