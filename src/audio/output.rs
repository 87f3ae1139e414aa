// Audio output through rodio
// One rodio sink per started source so any cue can be stopped on its own

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::ingest::AudioClip;
use super::sources::SourceTable;
use super::sync::{AudioSink, PlayRequest, SourceId};
use super::AudioError;

/// Plays regions of a decoded clip on the default output device
pub struct RodioSink {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    clip: Arc<AudioClip>,
    epoch: Instant,
    sources: SourceTable<Sink>,
}

impl RodioSink {
    /// Open the default output device
    pub fn open(clip: Arc<AudioClip>) -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| AudioError::Output(format!("Failed to create audio stream: {}", e)))?;

        Ok(Self {
            _stream: stream,
            handle,
            clip,
            epoch: Instant::now(),
            sources: SourceTable::new(),
        })
    }

    pub fn clip(&self) -> &AudioClip {
        &self.clip
    }
}

impl AudioSink for RodioSink {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn start(&mut self, request: PlayRequest) -> Option<SourceId> {
        let samples = self.clip.region(request.offset, request.duration).to_vec();
        if samples.is_empty() {
            return None;
        }

        let sink = match Sink::try_new(&self.handle) {
            Ok(sink) => sink,
            Err(e) => {
                log::warn!("Failed to create audio sink: {}", e);
                return None;
            }
        };

        let delay = request.at.saturating_sub(self.now());
        sink.append(SamplesBuffer::new(self.clip.channels, self.clip.sample_rate, samples).delay(delay));

        Some(self.sources.insert(sink))
    }

    fn stop(&mut self, source: SourceId) {
        if let Some(sink) = self.sources.remove(source) {
            sink.stop();
        }
    }

    fn drain_ended(&mut self) -> Vec<SourceId> {
        self.sources.drain_finished(Sink::empty)
    }
}

impl Drop for RodioSink {
    fn drop(&mut self) {
        for sink in self.sources.drain_all() {
            sink.stop();
        }
    }
}
