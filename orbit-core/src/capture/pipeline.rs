//! Capture pipeline
//!
//! One tokio task owns the encoder. It composes a frame on every tick of a
//! fixed-rate interval, forwards microphone audio, and stops when its
//! cancellation token fires. Stopping always finalizes the encoder, so
//! whatever was encoded before a failure or a pause is kept.

use bytes::Bytes;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, trace, warn};

use super::compose::{compose_frame, scale_overlay};
use super::{AudioFeed, VideoFeed};
use crate::encode::Encoder;
use crate::error::{OrbitError, Result};
use crate::types::{Rect, Size};

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Producing frames
    Running,
    /// Frame production and encoder suspended
    Paused,
    /// Stopped itself after an error; waiting to be collected
    Failed,
    /// Cancelled and finalized
    Finished,
}

/// Frame loop parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub fps: u32,
    /// Camera bubble in target-area coordinates
    pub overlay: Rect,
    /// Size of the target area the overlay is expressed in
    pub target_size: Size,
}

impl PipelineSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.fps.max(1) as u64)
    }
}

/// What a stopped pipeline leaves behind
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Finalized container, possibly partial
    pub output: Option<Bytes>,
    /// First error, if any
    pub error: Option<OrbitError>,
    pub frames: u64,
}

enum Command {
    Pause,
    Resume,
    MoveOverlay(Rect),
}

/// Handle to a running frame loop
pub struct CapturePipeline {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<PipelineState>,
    cancel: CancellationToken,
    task: JoinHandle<PipelineOutcome>,
    _cancel_on_drop: DropGuard,
}

struct FrameLoop {
    settings: PipelineSettings,
    screen: VideoFeed,
    camera: Option<VideoFeed>,
    audio: AudioFeed,
    encoder: Box<dyn Encoder>,
    state: watch::Sender<PipelineState>,
    commands: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
    frames: u64,
}

impl CapturePipeline {
    /// Spawn the frame loop
    pub fn start(
        settings: PipelineSettings,
        screen: VideoFeed,
        camera: Option<VideoFeed>,
        audio: AudioFeed,
        encoder: Box<dyn Encoder>,
    ) -> Self {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(PipelineState::Running);
        let cancel = CancellationToken::new();

        let frame_loop = FrameLoop {
            settings,
            screen,
            camera,
            audio,
            encoder,
            state: state_tx,
            commands,
            cancel: cancel.clone(),
            frames: 0,
        };

        info!(
            "Capture pipeline starting at {}fps, overlay {}",
            settings.fps, settings.overlay
        );
        let task = tokio::spawn(frame_loop.run());

        Self {
            commands: commands_tx,
            state,
            _cancel_on_drop: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    pub fn pause(&self) {
        let _ = self.commands.send(Command::Pause);
    }

    pub fn resume(&self) {
        let _ = self.commands.send(Command::Resume);
    }

    /// Move the camera overlay (target-area coordinates)
    pub fn move_overlay(&self, overlay: Rect) {
        let _ = self.commands.send(Command::MoveOverlay(overlay));
    }

    /// Resolves once the loop has stopped, e.g. after an encoder error
    pub async fn stopped(&mut self) {
        let _ = self
            .state
            .wait_for(|s| matches!(s, PipelineState::Failed | PipelineState::Finished))
            .await;
    }

    /// Cancel the loop and collect the finalized output
    pub async fn stop(self) -> PipelineOutcome {
        let Self { cancel, task, .. } = self;
        cancel.cancel();
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Capture pipeline task failed: {}", e);
                PipelineOutcome {
                    output: None,
                    error: Some(OrbitError::encode(format!("pipeline task failed: {}", e))),
                    frames: 0,
                }
            }
        }
    }
}

impl FrameLoop {
    async fn run(mut self) -> PipelineOutcome {
        let mut ticker = tokio::time::interval(self.settings.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut paused = false;
        let mut audio_open = true;
        let mut failure: Option<OrbitError> = None;

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                Some(command) = self.commands.recv() => match command {
                    Command::Pause if !paused => {
                        self.encoder.pause();
                        paused = true;
                        self.state.send_replace(PipelineState::Paused);
                        debug!("Capture paused after {} frames", self.frames);
                    }
                    Command::Resume if paused => {
                        self.encoder.resume();
                        paused = false;
                        ticker.reset();
                        self.state.send_replace(PipelineState::Running);
                        debug!("Capture resumed");
                    }
                    Command::MoveOverlay(overlay) => {
                        trace!("Overlay moved to {}", overlay);
                        self.settings.overlay = overlay;
                    }
                    _ => {}
                },

                chunk = self.audio.recv(), if audio_open => match chunk {
                    // Audio captured while paused is dropped
                    Some(chunk) if !paused => {
                        if let Err(e) = self.encoder.push_audio(&chunk) {
                            failure = Some(e);
                            break;
                        }
                    }
                    Some(_) => {}
                    None => {
                        warn!("Microphone stream ended, continuing without audio");
                        audio_open = false;
                    }
                },

                _ = ticker.tick(), if !paused => {
                    if let Err(e) = self.push_frame() {
                        failure = Some(e);
                        break;
                    }
                }
            }
        }

        self.finish(failure)
    }

    fn push_frame(&mut self) -> Result<()> {
        if self.screen.has_changed().is_err() {
            return Err(OrbitError::source_not_found("capture source closed"));
        }

        let Some(screen) = self.screen.borrow_and_update().clone() else {
            trace!("No screen frame yet");
            return Ok(());
        };

        if self
            .camera
            .as_ref()
            .is_some_and(|feed| feed.has_changed().is_err())
        {
            warn!("Camera stream ended, recording without overlay");
            self.camera = None;
        }
        let camera = self
            .camera
            .as_mut()
            .and_then(|feed| feed.borrow_and_update().clone());

        let overlay = scale_overlay(
            self.settings.overlay,
            self.settings.target_size,
            screen.size(),
        );
        let mut frame = compose_frame(&screen, camera.as_deref(), overlay);
        frame.pts = self.frames * self.settings.frame_interval().as_nanos() as u64;

        self.encoder.push_video(&frame)?;
        self.frames += 1;
        trace!("Pushed frame {}", self.frames);
        Ok(())
    }

    fn finish(self, failure: Option<OrbitError>) -> PipelineOutcome {
        let frames = self.frames;
        let state = self.state;

        if let Some(e) = &failure {
            error!("Capture pipeline failed after {} frames: {}", frames, e);
            state.send_replace(PipelineState::Failed);
        }

        match self.encoder.finalize() {
            Ok(output) => {
                info!("Encoder finalized: {} frames, {} bytes", frames, output.len());
                if failure.is_none() {
                    state.send_replace(PipelineState::Finished);
                }
                PipelineOutcome {
                    output: Some(output),
                    error: failure,
                    frames,
                }
            }
            Err(e) => {
                error!("Failed to finalize encoder: {}", e);
                state.send_replace(PipelineState::Failed);
                PipelineOutcome {
                    output: None,
                    error: Some(failure.unwrap_or(e)),
                    frames,
                }
            }
        }
    }
}
