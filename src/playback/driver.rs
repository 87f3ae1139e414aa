// Playback driver
// Async loop that feeds the scheduler real time and UI commands

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};

use crate::algorithms::AlgorithmChoice;
use crate::audio::{AudioSink, AudioSlicePlan};
use crate::trace::Permutation;

use super::scheduler::{PlaybackStatus, Scheduler, StepRenderer};

/// How often audio end reports are collected while final audio plays
pub const AUDIO_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// UI controls, one per scheduler operation
#[derive(Debug, Clone)]
pub enum PlaybackCommand {
    Start {
        permutation: Permutation,
        choice: AlgorithmChoice,
    },
    Pause,
    Resume,
    Stop,
    Reset,
    Replay,
    SetRate(u32),
    AttachAudio(AudioSlicePlan),
    DetachAudio,
    PlayFinalAudio,
    StopFinalAudio,
    Shutdown,
}

/// Run `scheduler` until `Shutdown` or until every command sender is gone
///
/// Status is published after every command and every tick. The scheduler is
/// handed back stopped, so its renderer and sink can be inspected.
pub async fn run_playback<R, A>(
    mut scheduler: Scheduler<R, A>,
    mut commands: mpsc::Receiver<PlaybackCommand>,
    status: watch::Sender<PlaybackStatus>,
) -> Scheduler<R, A>
where
    R: StepRenderer,
    A: AudioSink,
{
    let origin = Instant::now();
    let elapsed = || Instant::now().duration_since(origin);

    loop {
        let wake = scheduler.next_deadline().or_else(|| {
            scheduler
                .status()
                .is_playing_final_audio
                .then(|| elapsed() + AUDIO_POLL_INTERVAL)
        });

        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    log::debug!("Playback command channel closed");
                    break;
                };
                if !apply(&mut scheduler, elapsed(), command) {
                    break;
                }
            }
            _ = sleep_until(origin + wake.unwrap_or_default()), if wake.is_some() => {
                scheduler.poll(elapsed());
            }
        }

        status.send_replace(scheduler.status());
    }

    scheduler.stop();
    status.send_replace(scheduler.status());
    scheduler
}

/// Apply one command; false on `Shutdown`
fn apply<R, A>(scheduler: &mut Scheduler<R, A>, now: Duration, command: PlaybackCommand) -> bool
where
    R: StepRenderer,
    A: AudioSink,
{
    match command {
        PlaybackCommand::Start {
            permutation,
            choice,
        } => match scheduler.start(now, &permutation, &choice) {
            Ok(report) => {
                if let Some(warning) = report.warning {
                    log::warn!("Custom algorithm replaced by bubble sort: {}", warning);
                }
            }
            Err(e) => log::error!("Failed to start playback: {}", e),
        },
        PlaybackCommand::Pause => scheduler.pause(),
        PlaybackCommand::Resume => scheduler.resume(now),
        PlaybackCommand::Stop => scheduler.stop(),
        PlaybackCommand::Reset => scheduler.reset(),
        PlaybackCommand::Replay => scheduler.replay(now),
        PlaybackCommand::SetRate(speed) => scheduler.set_rate(now, speed),
        PlaybackCommand::AttachAudio(plan) => scheduler.attach_audio(plan),
        PlaybackCommand::DetachAudio => scheduler.detach_audio(),
        PlaybackCommand::PlayFinalAudio => {
            if !scheduler.play_final_audio() {
                log::debug!("Final audio unavailable");
            }
        }
        PlaybackCommand::StopFinalAudio => scheduler.stop_final_audio(),
        PlaybackCommand::Shutdown => return false,
    }
    true
}
