// Playback scheduler
// Timed state machine that walks a trace, keeping the renderer and the audio cues in step
//
// The scheduler never reads a clock. Every time-dependent call takes `now`, a
// monotonic offset chosen by the caller, and `poll(now)` fires whatever is
// due. The async driver feeds it real time; tests feed it whatever they like.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::algorithms::{generate, AlgorithmChoice};
use crate::audio::{AudioSink, AudioSlicePlan, CueSynchronizer, SourceId};
use crate::sandbox::{run_custom, SandboxError, SandboxLimits};
use crate::trace::{Permutation, Trace, TraceStep};

use super::rate::{clamp_speed, tick_interval, DEFAULT_SPEED};
use super::PlaybackError;

/// Delay between completion and the final audio sequence
pub const FINAL_AUDIO_SETTLE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No trace loaded
    Idle,
    /// Trace loaded at step 0, not playing
    Ready,
    Playing,
    Paused,
    /// Last step reached
    Complete,
}

/// Receives every emitted step
pub trait StepRenderer {
    fn render(&mut self, index: usize, step: &TraceStep);

    /// The trace was discarded
    fn clear(&mut self) {}
}

/// Renderer that keeps every frame it was handed
#[derive(Debug, Default, Clone)]
pub struct FrameLog {
    pub frames: Vec<(usize, TraceStep)>,
    pub clears: usize,
}

impl StepRenderer for FrameLog {
    fn render(&mut self, index: usize, step: &TraceStep) {
        self.frames.push((index, step.clone()));
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}

/// Trace plus the position playback has reached
#[derive(Debug, Clone)]
pub struct TraceCursor {
    trace: Trace,
    current_step: usize,
    is_playing: bool,
    is_sorted: bool,
}

impl TraceCursor {
    fn new(trace: Trace) -> Self {
        Self {
            trace,
            current_step: 0,
            is_playing: false,
            is_sorted: false,
        }
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_sorted(&self) -> bool {
        self.is_sorted
    }

    pub fn current(&self) -> Option<&TraceStep> {
        self.trace.step(self.current_step)
    }

    fn last_index(&self) -> usize {
        self.trace.len().saturating_sub(1)
    }
}

/// Read-only view for UI controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub current_step: usize,
    pub total_steps: usize,
    pub is_playing: bool,
    pub is_sorted: bool,
    pub is_playing_final_audio: bool,
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self {
            state: PlaybackState::Idle,
            current_step: 0,
            total_steps: 0,
            is_playing: false,
            is_sorted: false,
            is_playing_final_audio: false,
        }
    }
}

/// Outcome of loading a trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReport {
    pub total_steps: usize,
    /// Custom program failure; the trace is the Bubble Sort fallback
    pub warning: Option<SandboxError>,
}

/// One pending deadline; re-arming or cancelling bumps the generation so
/// a deadline observed before the change can never fire
#[derive(Debug, Default, Clone, Copy)]
struct TimerSlot {
    generation: u64,
    deadline: Option<Duration>,
}

impl TimerSlot {
    fn arm(&mut self, deadline: Duration) {
        self.generation += 1;
        self.deadline = Some(deadline);
    }

    fn cancel(&mut self) {
        if self.deadline.is_some() {
            self.generation += 1;
            self.deadline = None;
        }
    }

    fn due(&self, now: Duration) -> Option<(u64, Duration)> {
        self.deadline
            .filter(|&deadline| deadline <= now)
            .map(|deadline| (self.generation, deadline))
    }

    /// Disarm if still on `generation`; false when something re-armed it since
    fn take(&mut self, generation: u64) -> bool {
        if self.generation == generation && self.deadline.is_some() {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Step,
    Settle,
}

pub struct Scheduler<R: StepRenderer, A: AudioSink> {
    renderer: R,
    audio: CueSynchronizer<A>,
    state: PlaybackState,
    cursor: Option<TraceCursor>,
    speed: u32,
    interval: Duration,
    limits: SandboxLimits,
    step_timer: TimerSlot,
    settle_timer: TimerSlot,
}

impl<R: StepRenderer, A: AudioSink> Scheduler<R, A> {
    pub fn new(renderer: R, sink: A) -> Self {
        Self {
            renderer,
            audio: CueSynchronizer::new(sink),
            state: PlaybackState::Idle,
            cursor: None,
            speed: DEFAULT_SPEED,
            interval: tick_interval(DEFAULT_SPEED, None),
            limits: SandboxLimits::default(),
            step_timer: TimerSlot::default(),
            settle_timer: TimerSlot::default(),
        }
    }

    pub fn with_sandbox_limits(mut self, limits: SandboxLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_speed(mut self, speed: u32) -> Self {
        self.speed = clamp_speed(speed);
        self.refresh_interval();
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn cursor(&self) -> Option<&TraceCursor> {
        self.cursor.as_ref()
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn audio(&self) -> &CueSynchronizer<A> {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut CueSynchronizer<A> {
        &mut self.audio
    }

    pub fn status(&self) -> PlaybackStatus {
        let (current_step, total_steps, is_playing, is_sorted) = match &self.cursor {
            Some(cursor) => (
                cursor.current_step,
                cursor.trace.len(),
                cursor.is_playing,
                cursor.is_sorted,
            ),
            None => (0, 0, false, false),
        };

        PlaybackStatus {
            state: self.state,
            current_step,
            total_steps,
            is_playing,
            is_sorted,
            is_playing_final_audio: self.audio.is_playing_final(),
        }
    }

    /// Generate a trace, install it at step 0 and start playing
    pub fn start(
        &mut self,
        now: Duration,
        permutation: &Permutation,
        choice: &AlgorithmChoice,
    ) -> Result<StartReport, PlaybackError> {
        let report = self.load(permutation, choice)?;
        self.play(now);
        Ok(report)
    }

    /// Generate a trace and install it at step 0 without playing
    ///
    /// On error the previous trace and state are left untouched.
    pub fn load(
        &mut self,
        permutation: &Permutation,
        choice: &AlgorithmChoice,
    ) -> Result<StartReport, PlaybackError> {
        let (trace, warning) = match choice {
            AlgorithmChoice::BuiltIn(algorithm) => (generate(*algorithm, permutation.as_slice())?, None),
            AlgorithmChoice::Custom(source) => {
                let outcome = run_custom(source, permutation, &self.limits);
                (outcome.trace, outcome.warning)
            }
        };

        self.halt();
        let total_steps = trace.len();
        self.cursor = Some(TraceCursor::new(trace));
        self.set_state(PlaybackState::Ready);
        self.emit_current(false);

        Ok(StartReport {
            total_steps,
            warning,
        })
    }

    /// Ready -> Playing; plays the step-0 cue and arms the first tick
    pub fn play(&mut self, now: Duration) {
        if self.state != PlaybackState::Ready {
            return;
        }
        let Some(cursor) = self.cursor.as_mut() else {
            return;
        };

        cursor.is_playing = true;
        self.set_state(PlaybackState::Playing);

        if let Some(step) = self.cursor.as_ref().and_then(TraceCursor::current) {
            self.audio.on_step(0, step);
        }

        if self.cursor.as_ref().is_some_and(|c| c.current_step >= c.last_index()) {
            self.complete(now);
        } else {
            self.step_timer.arm(now + self.interval);
        }
    }

    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.step_timer.cancel();
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.is_playing = false;
        }
        self.set_state(PlaybackState::Paused);
    }

    pub fn resume(&mut self, now: Duration) {
        if self.state != PlaybackState::Paused {
            return;
        }
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.is_playing = true;
        }
        self.set_state(PlaybackState::Playing);
        self.step_timer.arm(now + self.interval);
    }

    /// Halt audio and timers, discard the trace, go Idle
    pub fn stop(&mut self) {
        self.halt();
        if self.cursor.take().is_some() {
            self.renderer.clear();
        }
        self.set_state(PlaybackState::Idle);
    }

    pub fn reset(&mut self) {
        self.stop();
    }

    /// Back to step 0 of the current trace and play again
    pub fn replay(&mut self, now: Duration) {
        if self.rewind() {
            self.play(now);
        }
    }

    /// Back to step 0 of the current trace, Ready; false when nothing is loaded
    pub fn rewind(&mut self) -> bool {
        if self.cursor.is_none() {
            return false;
        }

        self.halt();
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.current_step = 0;
            cursor.is_playing = false;
            cursor.is_sorted = false;
        }
        self.set_state(PlaybackState::Ready);
        self.emit_current(false);
        true
    }

    /// Change the speed; a pending tick is replaced by one on the new interval
    pub fn set_rate(&mut self, now: Duration, speed: u32) {
        self.speed = clamp_speed(speed);
        self.refresh_interval();

        if self.state == PlaybackState::Playing {
            self.step_timer.arm(now + self.interval);
        }
    }

    /// Pace by and cue from `plan`; takes effect from the next tick
    pub fn attach_audio(&mut self, plan: AudioSlicePlan) {
        self.settle_timer.cancel();
        self.audio.attach(plan);
        self.refresh_interval();
    }

    pub fn detach_audio(&mut self) {
        self.settle_timer.cancel();
        self.audio.detach();
        self.refresh_interval();
    }

    /// Play the sorted sequence now; no-op unless complete with audio attached
    pub fn play_final_audio(&mut self) -> bool {
        if self.state != PlaybackState::Complete || !self.audio.has_audio() {
            return false;
        }
        self.settle_timer.cancel();

        match self.cursor.as_ref() {
            Some(cursor) => self.audio.play_final_sequence(cursor.trace.final_snapshot()),
            None => false,
        }
    }

    pub fn stop_final_audio(&mut self) {
        self.settle_timer.cancel();
        self.audio.stop_final_sequence();
    }

    /// Forward an end report from the audio backend
    pub fn on_audio_ended(&mut self, source: SourceId) {
        if self.audio.on_source_ended(source) {
            log::debug!("Final audio sequence finished");
        }
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.step_timer.deadline, self.settle_timer.deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire every timer due at `now`, oldest first; returns the steps emitted
    pub fn poll(&mut self, now: Duration) -> usize {
        self.audio.poll_ended();

        let mut emitted = 0;
        loop {
            let due = [
                (Timer::Step, self.step_timer.due(now)),
                (Timer::Settle, self.settle_timer.due(now)),
            ]
            .into_iter()
            .filter_map(|(timer, due)| due.map(|(generation, deadline)| (timer, generation, deadline)))
            .min_by_key(|&(_, _, deadline)| deadline);

            let Some((timer, generation, deadline)) = due else {
                return emitted;
            };

            match timer {
                Timer::Step => {
                    if self.step_timer.take(generation) && self.advance(deadline) {
                        emitted += 1;
                    }
                }
                Timer::Settle => {
                    if self.settle_timer.take(generation) {
                        self.play_final_audio();
                    }
                }
            }
        }
    }

    /// One tick: move to the next step, completing on the last one
    fn advance(&mut self, deadline: Duration) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        let Some(cursor) = self.cursor.as_mut() else {
            return false;
        };

        if cursor.current_step < cursor.last_index() {
            cursor.current_step += 1;
        }

        if cursor.current_step >= cursor.last_index() {
            self.complete(deadline);
        } else {
            self.emit_current(true);
            self.step_timer.arm(deadline + self.interval);
        }
        true
    }

    /// Enter Complete: show the final snapshot settled and queue the final audio
    fn complete(&mut self, now: Duration) {
        self.step_timer.cancel();

        let Some(cursor) = self.cursor.as_mut() else {
            return;
        };
        cursor.is_playing = false;
        cursor.is_sorted = true;

        let index = cursor.current_step;
        if index > 0 {
            if let Some(step) = cursor.trace.step(index) {
                let settled = TraceStep {
                    snapshot: step.snapshot.clone(),
                    highlights: Vec::new(),
                };
                self.renderer.render(index, &settled);
            }
        }

        self.set_state(PlaybackState::Complete);

        if self.audio.has_audio() {
            self.settle_timer.arm(now + FINAL_AUDIO_SETTLE);
        }
    }

    /// Render the current step, and cue it when `with_audio`
    fn emit_current(&mut self, with_audio: bool) {
        let Some(cursor) = self.cursor.as_ref() else {
            return;
        };
        let index = cursor.current_step;
        if let Some(step) = cursor.trace.step(index) {
            self.renderer.render(index, step);
            if with_audio {
                self.audio.on_step(index, step);
            }
        }
    }

    /// Cancel both timers and silence everything
    fn halt(&mut self) {
        self.step_timer.cancel();
        self.settle_timer.cancel();
        self.audio.stop_all();
    }

    fn refresh_interval(&mut self) {
        let slice = self.audio.plan().map(AudioSlicePlan::slice_duration);
        self.interval = tick_interval(self.speed, slice);
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            log::debug!("Playback {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}

impl<R: StepRenderer, A: AudioSink> Drop for Scheduler<R, A> {
    fn drop(&mut self) {
        self.step_timer.cancel();
        self.settle_timer.cancel();
        self.audio.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{bubble_sort, Algorithm};
    use crate::audio::RecordingSink;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn scheduler() -> Scheduler<FrameLog, RecordingSink> {
        // speed 100 without audio: 100 ms ticks
        Scheduler::new(FrameLog::default(), RecordingSink::new()).with_speed(100)
    }

    fn bubble() -> AlgorithmChoice {
        AlgorithmChoice::BuiltIn(Algorithm::Bubble)
    }

    fn input() -> Permutation {
        Permutation::new(vec![4, 3, 2, 1, 0]).unwrap()
    }

    #[test]
    fn test_start_emits_step_zero_and_arms_one_tick() {
        let mut scheduler = scheduler();
        let report = scheduler.start(ms(0), &input(), &bubble()).unwrap();

        assert_eq!(report.total_steps, bubble_sort(&[4, 3, 2, 1, 0]).len());
        assert_eq!(report.warning, None);
        assert_eq!(scheduler.state(), PlaybackState::Playing);
        assert_eq!(scheduler.renderer().frames.len(), 1);
        assert_eq!(scheduler.renderer().frames[0].0, 0);
        assert_eq!(scheduler.next_deadline(), Some(ms(100)));
    }

    #[test]
    fn test_plays_to_completion_in_order() {
        let mut scheduler = scheduler();
        let report = scheduler.start(ms(0), &input(), &bubble()).unwrap();

        let mut now = ms(0);
        while let Some(deadline) = scheduler.next_deadline() {
            now = deadline;
            scheduler.poll(now);
        }

        let status = scheduler.status();
        assert_eq!(status.state, PlaybackState::Complete);
        assert!(status.is_sorted);
        assert!(!status.is_playing);
        assert_eq!(status.current_step, report.total_steps - 1);

        let indices: Vec<usize> = scheduler.renderer().frames.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, (0..report.total_steps).collect::<Vec<_>>());
        let (_, last) = scheduler.renderer().frames.last().unwrap();
        assert_eq!(last.snapshot, vec![0, 1, 2, 3, 4]);
        assert!(last.highlights.is_empty());
        assert_eq!(now, ms(100) * (report.total_steps as u32 - 1));
    }

    #[test]
    fn test_late_poll_catches_up_one_step_per_tick() {
        let mut scheduler = scheduler();
        scheduler.start(ms(0), &input(), &bubble()).unwrap();

        assert_eq!(scheduler.poll(ms(99)), 0);
        assert_eq!(scheduler.poll(ms(350)), 3);
        assert_eq!(scheduler.status().current_step, 3);
        assert_eq!(scheduler.next_deadline(), Some(ms(400)));
    }

    #[test]
    fn test_pause_and_resume_keep_position() {
        let mut scheduler = scheduler();
        scheduler.start(ms(0), &input(), &bubble()).unwrap();
        scheduler.poll(ms(200));

        scheduler.pause();
        scheduler.pause();
        assert_eq!(scheduler.state(), PlaybackState::Paused);
        assert_eq!(scheduler.next_deadline(), None);
        assert_eq!(scheduler.poll(ms(5_000)), 0);
        assert_eq!(scheduler.status().current_step, 2);

        scheduler.resume(ms(5_000));
        assert_eq!(scheduler.next_deadline(), Some(ms(5_100)));
        assert_eq!(scheduler.poll(ms(5_100)), 1);
        assert_eq!(scheduler.status().current_step, 3);
    }

    #[test]
    fn test_set_rate_replaces_pending_tick() {
        let mut scheduler = scheduler();
        scheduler.start(ms(0), &input(), &bubble()).unwrap();

        scheduler.set_rate(ms(50), 1);
        assert_eq!(scheduler.interval(), ms(1981));
        assert_eq!(scheduler.next_deadline(), Some(ms(2031)));
        assert_eq!(scheduler.poll(ms(100)), 0);
    }

    #[test]
    fn test_stop_and_reset_are_idempotent() {
        let mut scheduler = scheduler();
        scheduler.stop();
        scheduler.reset();
        assert_eq!(scheduler.status(), PlaybackStatus::default());

        scheduler.start(ms(0), &input(), &bubble()).unwrap();
        scheduler.poll(ms(300));
        scheduler.reset();
        scheduler.reset();

        let status = scheduler.status();
        assert_eq!(status.state, PlaybackState::Idle);
        assert_eq!(status.current_step, 0);
        assert!(!status.is_playing);
        assert!(!status.is_sorted);
        assert_eq!(scheduler.next_deadline(), None);
        assert_eq!(scheduler.renderer().clears, 1);
    }

    #[test]
    fn test_replay_from_complete() {
        let mut scheduler = scheduler();
        scheduler.start(ms(0), &input(), &bubble()).unwrap();
        scheduler.poll(ms(60_000));
        assert_eq!(scheduler.state(), PlaybackState::Complete);

        scheduler.replay(ms(60_000));
        let status = scheduler.status();
        assert_eq!(status.state, PlaybackState::Playing);
        assert_eq!(status.current_step, 0);
        assert!(!status.is_sorted);
        assert_eq!(scheduler.next_deadline(), Some(ms(60_100)));
    }

    #[test]
    fn test_load_then_play() {
        let mut scheduler = scheduler();
        scheduler.load(&input(), &bubble()).unwrap();
        assert_eq!(scheduler.state(), PlaybackState::Ready);
        assert_eq!(scheduler.next_deadline(), None);

        scheduler.play(ms(10));
        assert_eq!(scheduler.state(), PlaybackState::Playing);
        assert_eq!(scheduler.next_deadline(), Some(ms(110)));
    }

    #[test]
    fn test_sorted_single_step_trace_completes_at_once() {
        let mut scheduler = scheduler();
        let permutation = Permutation::identity(4).unwrap();
        scheduler
            .start(ms(0), &permutation, &AlgorithmChoice::BuiltIn(Algorithm::Quick))
            .unwrap();
        assert_eq!(scheduler.state(), PlaybackState::Complete);
        assert!(scheduler.status().is_sorted);
    }

    #[test]
    fn test_broken_custom_program_still_loads() {
        let mut scheduler = scheduler();
        scheduler.start(ms(0), &input(), &bubble()).unwrap();
        scheduler.poll(ms(100));

        let report = scheduler
            .load(&input(), &AlgorithmChoice::Custom("oops(".to_string()))
            .unwrap();
        assert!(matches!(report.warning, Some(SandboxError::Parse { .. })));
        assert_eq!(report.total_steps, bubble_sort(&[4, 3, 2, 1, 0]).len());
        assert_eq!(scheduler.state(), PlaybackState::Ready);
        assert_eq!(scheduler.status().current_step, 0);
    }

    #[test]
    fn test_audio_cues_follow_steps() {
        let mut scheduler = scheduler();
        scheduler.attach_audio(AudioSlicePlan::partition(ms(5_000), None, 5).unwrap());
        // slice 1 s at speed 100 -> 505 ms ticks
        assert_eq!(scheduler.interval(), ms(505));

        scheduler.start(ms(0), &input(), &bubble()).unwrap();
        // step 0 cue: identity at position 0
        assert_eq!(scheduler.audio().sink().started.len(), 1);
        assert_eq!(scheduler.audio().sink().started[0].1.offset, ms(4_000));

        scheduler.poll(ms(505));
        let sink = scheduler.audio().sink();
        assert_eq!(sink.started.len(), 2);
        assert_eq!(sink.stopped, vec![SourceId(0)]);
    }

    #[test]
    fn test_final_audio_after_settle_delay() {
        let mut scheduler = scheduler();
        scheduler.attach_audio(AudioSlicePlan::partition(ms(5_000), None, 5).unwrap());
        scheduler.start(ms(0), &input(), &bubble()).unwrap();

        let mut now = ms(0);
        while scheduler.state() != PlaybackState::Complete {
            now = scheduler.next_deadline().unwrap();
            scheduler.poll(now);
        }
        let cues = scheduler.audio().sink().started.len();
        assert_eq!(scheduler.next_deadline(), Some(now + FINAL_AUDIO_SETTLE));

        scheduler.poll(now + FINAL_AUDIO_SETTLE);
        assert!(scheduler.status().is_playing_final_audio);
        assert_eq!(scheduler.audio().sink().started.len(), cues + 5);

        scheduler.stop();
        assert!(scheduler.audio().sink().active().is_empty());
        assert!(!scheduler.status().is_playing_final_audio);
    }

    #[test]
    fn test_play_final_audio_without_audio_is_noop() {
        let mut scheduler = scheduler();
        assert!(!scheduler.play_final_audio());
        scheduler.start(ms(0), &input(), &bubble()).unwrap();
        scheduler.poll(ms(60_000));
        assert!(!scheduler.play_final_audio());
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_timer_slot_generation() {
        let mut slot = TimerSlot::default();
        slot.arm(ms(10));
        let (generation, _) = slot.due(ms(10)).unwrap();
        slot.arm(ms(20));
        assert!(!slot.take(generation));
        assert_eq!(slot.due(ms(15)), None);
        slot.cancel();
        assert_eq!(slot.deadline, None);
    }
}
