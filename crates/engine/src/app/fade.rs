use std::time::Duration;

use super::timing::fast_ticks;

const FADE_FAST_TICKS_PER_STEP: f64 = 4.0;
const FADE_STEPS: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

impl FadeDirection {
    fn target_alpha(self) -> u8 {
        match self {
            FadeDirection::In => 255,
            FadeDirection::Out => 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveFade {
    direction: FadeDirection,
    elapsed: Duration,
}

/// Screen fade driven by real time, advanced once per rendered frame.
///
/// The ramp covers 16 steps of 4 fast-timer ticks each, so a full fade takes
/// 64 / 280 s regardless of frame rate.
#[derive(Debug, Clone)]
pub struct FadeState {
    alpha: u8,
    active: Option<ActiveFade>,
}

impl Default for FadeState {
    fn default() -> Self {
        Self::faded_in()
    }
}

impl FadeState {
    pub fn faded_in() -> Self {
        Self {
            alpha: 255,
            active: None,
        }
    }

    pub fn faded_out() -> Self {
        Self {
            alpha: 0,
            active: None,
        }
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn is_fading(&self) -> bool {
        self.active.is_some()
    }

    pub fn direction(&self) -> Option<FadeDirection> {
        self.active.map(|fade| fade.direction)
    }

    /// Starts a fade. Returns false, and does nothing, when the screen is
    /// already at the fade's target alpha.
    pub fn start(&mut self, direction: FadeDirection) -> bool {
        if self.active.is_none() && self.alpha == direction.target_alpha() {
            return false;
        }
        self.active = Some(ActiveFade {
            direction,
            elapsed: Duration::ZERO,
        });
        self.alpha = alpha_for(direction, 0.0);
        true
    }

    /// Advances the running fade. Returns the direction of a fade that
    /// finished during this call.
    pub fn advance(&mut self, dt: Duration) -> Option<FadeDirection> {
        let fade = self.active.as_mut()?;
        fade.elapsed = fade.elapsed.saturating_add(dt);
        let factor = (fast_ticks(fade.elapsed) / FADE_FAST_TICKS_PER_STEP / FADE_STEPS).min(1.0);
        let direction = fade.direction;
        self.alpha = alpha_for(direction, factor);

        if factor >= 1.0 {
            self.active = None;
            return Some(direction);
        }
        None
    }
}

fn alpha_for(direction: FadeDirection, factor: f64) -> u8 {
    let value = match direction {
        FadeDirection::In => factor,
        FadeDirection::Out => 1.0 - factor,
    };
    (255.0 * value).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_fade() -> Duration {
        Duration::from_secs_f64(64.0 / 280.0) + Duration::from_millis(1)
    }

    #[test]
    fn fade_to_current_alpha_is_skipped() {
        let mut fade = FadeState::faded_in();
        assert!(!fade.start(FadeDirection::In));
        assert!(!fade.is_fading());

        let mut fade = FadeState::faded_out();
        assert!(!fade.start(FadeDirection::Out));
    }

    #[test]
    fn fade_out_ramps_down_to_zero() {
        let mut fade = FadeState::faded_in();
        assert!(fade.start(FadeDirection::Out));
        assert_eq!(fade.alpha(), 255);

        // 32 fast ticks is half the ramp
        assert_eq!(fade.advance(Duration::from_secs_f64(32.5 / 280.0)), None);
        assert_eq!(fade.alpha(), 128);

        assert_eq!(fade.advance(full_fade()), Some(FadeDirection::Out));
        assert_eq!(fade.alpha(), 0);
        assert!(!fade.is_fading());
    }

    #[test]
    fn fade_in_finishes_at_full_alpha() {
        let mut fade = FadeState::faded_out();
        assert!(fade.start(FadeDirection::In));
        assert_eq!(fade.alpha(), 0);

        let mut finished = None;
        for _ in 0..20 {
            finished = fade.advance(Duration::from_millis(16));
            if finished.is_some() {
                break;
            }
        }
        assert_eq!(finished, Some(FadeDirection::In));
        assert_eq!(fade.alpha(), 255);
    }

    #[test]
    fn advance_without_fade_is_noop() {
        let mut fade = FadeState::faded_in();
        assert_eq!(fade.advance(Duration::from_secs(1)), None);
        assert_eq!(fade.alpha(), 255);
    }
}
