// Audio Cue Synchronizer
// Turns trace steps into slice playback requests, one cue at a time, plus the final back-to-back sequence

use std::time::Duration;

use crate::trace::TraceStep;

use super::slices::{AudioSlice, AudioSlicePlan};

/// Cues at or below this length are not worth starting
pub const MIN_CUE_DURATION: Duration = Duration::from_millis(10);

/// Handle for one started source, assigned by the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u64);

/// A region of the clip to play, at a time on the sink's clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayRequest {
    /// When to start, on the sink clock
    pub at: Duration,
    /// Where in the clip to start
    pub offset: Duration,
    pub duration: Duration,
}

/// Audio output the synchronizer drives
///
/// Implementations own the decoded buffer; requests only name regions of it.
pub trait AudioSink {
    /// Current time on the sink's clock
    fn now(&self) -> Duration;

    /// Start a source; `None` when the sink could not start it
    fn start(&mut self, request: PlayRequest) -> Option<SourceId>;

    /// Stop a source; stopping one that already ended is a no-op
    fn stop(&mut self, source: SourceId);

    /// Sources that finished on their own since the last call
    fn drain_ended(&mut self) -> Vec<SourceId> {
        Vec::new()
    }
}

/// Sink that plays nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn now(&self) -> Duration {
        Duration::ZERO
    }

    fn start(&mut self, _request: PlayRequest) -> Option<SourceId> {
        None
    }

    fn stop(&mut self, _source: SourceId) {}
}

/// In-memory sink that logs every call, for tests and headless runs
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub clock: Duration,
    pub started: Vec<(SourceId, PlayRequest)>,
    pub stopped: Vec<SourceId>,
    pub ended: Vec<SourceId>,
    next_id: u64,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a source as finished; reported by the next `drain_ended`
    pub fn finish(&mut self, source: SourceId) {
        self.ended.push(source);
    }

    /// Sources started and not yet stopped
    pub fn active(&self) -> Vec<SourceId> {
        self.started
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| !self.stopped.contains(id))
            .collect()
    }
}

impl AudioSink for RecordingSink {
    fn now(&self) -> Duration {
        self.clock
    }

    fn start(&mut self, request: PlayRequest) -> Option<SourceId> {
        let id = SourceId(self.next_id);
        self.next_id += 1;
        self.started.push((id, request));
        Some(id)
    }

    fn stop(&mut self, source: SourceId) {
        if !self.stopped.contains(&source) {
            self.stopped.push(source);
        }
    }

    fn drain_ended(&mut self) -> Vec<SourceId> {
        std::mem::take(&mut self.ended)
    }
}

/// Clip a single cue to the buffer: start no later than 10 ms before the
/// end, never run past it, skip what is left if it is 10 ms or shorter
pub fn clip_cue(slice: AudioSlice, buffer: Duration) -> Option<(Duration, Duration)> {
    let offset = slice.start.min(buffer.saturating_sub(MIN_CUE_DURATION));
    let duration = slice.duration.min(buffer.saturating_sub(offset));
    (duration > MIN_CUE_DURATION).then_some((offset, duration))
}

/// Owns the single current cue and the final-sequence sources
pub struct CueSynchronizer<A: AudioSink> {
    sink: A,
    plan: Option<AudioSlicePlan>,
    current: Option<SourceId>,
    final_sources: Vec<SourceId>,
    final_tail: Option<SourceId>,
    playing_final: bool,
}

impl<A: AudioSink> CueSynchronizer<A> {
    pub fn new(sink: A) -> Self {
        Self {
            sink,
            plan: None,
            current: None,
            final_sources: Vec::new(),
            final_tail: None,
            playing_final: false,
        }
    }

    pub fn sink(&self) -> &A {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut A {
        &mut self.sink
    }

    pub fn plan(&self) -> Option<&AudioSlicePlan> {
        self.plan.as_ref()
    }

    pub fn has_audio(&self) -> bool {
        self.plan.is_some()
    }

    pub fn is_playing_final(&self) -> bool {
        self.playing_final
    }

    /// Replace the slice plan; anything still sounding belongs to the old one
    pub fn attach(&mut self, plan: AudioSlicePlan) {
        self.stop_all();
        self.plan = Some(plan);
    }

    pub fn detach(&mut self) {
        self.stop_all();
        self.plan = None;
    }

    /// Slice to sound for step `index`
    ///
    /// Step 0 sounds the identity at the first highlighted position, or at
    /// position 0 when nothing is highlighted. Later steps sound the identity
    /// at their first highlighted position; settled steps stay silent.
    pub fn cue_for_step(&self, index: usize, step: &TraceStep) -> Option<AudioSlice> {
        let plan = self.plan.as_ref()?;
        let position = match step.highlights.first() {
            Some(&position) => position,
            None if index == 0 => 0,
            None => return None,
        };
        let identity = *step.snapshot.get(position)?;
        plan.get(identity)
    }

    /// Emit the cue for a step, if it has one
    pub fn on_step(&mut self, index: usize, step: &TraceStep) {
        if let Some(slice) = self.cue_for_step(index, step) {
            self.play_cue(slice);
        }
    }

    /// Stop the current cue, then start `slice` immediately
    pub fn play_cue(&mut self, slice: AudioSlice) {
        let Some(buffer) = self.plan.as_ref().map(AudioSlicePlan::buffer_duration) else {
            return;
        };

        self.stop_cue();

        if let Some((offset, duration)) = clip_cue(slice, buffer) {
            let at = self.sink.now();
            self.current = self.sink.start(PlayRequest {
                at,
                offset,
                duration,
            });
            if self.current.is_none() {
                log::warn!("Audio sink refused cue at {:?}", offset);
            }
        }
    }

    pub fn stop_cue(&mut self) {
        if let Some(source) = self.current.take() {
            self.sink.stop(source);
        }
    }

    /// Play one slice per final position back to back, in position order
    ///
    /// Returns false when there is nothing to play.
    pub fn play_final_sequence(&mut self, final_snapshot: &[usize]) -> bool {
        let Some(plan) = self.plan.clone() else {
            return false;
        };
        if final_snapshot.is_empty() {
            return false;
        }

        self.stop_final_sequence();
        self.playing_final = true;

        let buffer = plan.buffer_duration();
        let reference = self.sink.now();
        let last = final_snapshot.len() - 1;

        for (position, &identity) in final_snapshot.iter().enumerate() {
            let Some(slice) = plan.get(identity) else {
                continue;
            };

            let offset = slice.duration * position as u32;
            let duration = slice.duration.min(buffer.saturating_sub(slice.start));
            if duration.is_zero() {
                continue;
            }

            match self.sink.start(PlayRequest {
                at: reference + offset,
                offset: slice.start,
                duration,
            }) {
                Some(source) => {
                    self.final_sources.push(source);
                    if position == last {
                        self.final_tail = Some(source);
                    }
                }
                None => log::warn!("Audio sink refused final slice at position {}", position),
            }
        }

        // nothing left to signal the end
        if self.final_tail.is_none() {
            self.playing_final = false;
        }

        true
    }

    /// Cancel every pending or sounding final-sequence source
    pub fn stop_final_sequence(&mut self) {
        for source in self.final_sources.drain(..) {
            self.sink.stop(source);
        }
        self.final_tail = None;
        self.playing_final = false;
    }

    pub fn stop_all(&mut self) {
        self.stop_cue();
        self.stop_final_sequence();
    }

    /// A source finished; returns true when it ended the final sequence
    pub fn on_source_ended(&mut self, source: SourceId) -> bool {
        if self.current == Some(source) {
            self.current = None;
        }
        self.final_sources.retain(|&s| s != source);

        if self.final_tail == Some(source) {
            self.final_tail = None;
            self.playing_final = false;
            return true;
        }
        false
    }

    /// Forward every end report from the sink
    pub fn poll_ended(&mut self) -> bool {
        let mut sequence_ended = false;
        for source in self.sink.drain_ended() {
            sequence_ended |= self.on_source_ended(source);
        }
        sequence_ended
    }
}
