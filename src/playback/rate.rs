// Playback rate
// Maps the speed control onto a tick interval

use std::time::Duration;

pub const MIN_SPEED: u32 = 1;
pub const MAX_SPEED: u32 = 200;
pub const DEFAULT_SPEED: u32 = 50;

/// Shortest interval between two steps
pub const MIN_TICK: Duration = Duration::from_millis(10);

/// Longest interval when pacing by audio slices
pub const MAX_AUDIO_TICK: Duration = Duration::from_millis(2000);

pub fn clamp_speed(speed: u32) -> u32 {
    speed.clamp(MIN_SPEED, MAX_SPEED)
}

/// Interval between steps at `speed`
///
/// With audio attached the interval follows the slice length:
/// `slice_ms * (201 - speed) / 200`, kept within 10 ms..2 s.
/// Without audio it is `2000 - speed * 19` ms, never below 10 ms.
pub fn tick_interval(speed: u32, slice_duration: Option<Duration>) -> Duration {
    let speed = clamp_speed(speed);

    match slice_duration {
        Some(slice) => {
            let nanos = slice.as_nanos() * u128::from(MAX_SPEED + 1 - speed) / u128::from(MAX_SPEED);
            let scaled = u64::try_from(nanos).map_or(MAX_AUDIO_TICK, Duration::from_nanos);
            scaled.clamp(MIN_TICK, MAX_AUDIO_TICK)
        }
        None => {
            let millis = 2000i64 - i64::from(speed) * 19;
            Duration::from_millis(millis.max(10) as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_interval() {
        assert_eq!(tick_interval(1, None), Duration::from_millis(1981));
        assert_eq!(tick_interval(50, None), Duration::from_millis(1050));
        assert_eq!(tick_interval(100, None), Duration::from_millis(100));
        assert_eq!(tick_interval(105, None), Duration::from_millis(10));
        assert_eq!(tick_interval(200, None), Duration::from_millis(10));
    }

    #[test]
    fn test_audio_interval_follows_slice() {
        let slice = Some(Duration::from_millis(400));
        assert_eq!(tick_interval(1, slice), Duration::from_millis(400));
        assert_eq!(tick_interval(101, slice), Duration::from_millis(200));
        assert_eq!(tick_interval(200, slice), Duration::from_millis(10));
    }

    #[test]
    fn test_audio_interval_is_capped() {
        assert_eq!(tick_interval(1, Some(Duration::from_secs(30))), MAX_AUDIO_TICK);
        assert_eq!(tick_interval(150, Some(Duration::from_millis(5))), MIN_TICK);
    }

    #[test]
    fn test_speed_is_clamped() {
        assert_eq!(tick_interval(0, None), tick_interval(1, None));
        assert_eq!(tick_interval(900, None), tick_interval(200, None));
    }
}
