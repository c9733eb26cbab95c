//! Capture agent
//!
//! Lives in the camera surface. Consumes the controller's [`SurfaceMessage`]s,
//! owns every stream handle and the running pipeline, and reports back with
//! [`CaptureEvent`]s.

use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use super::pipeline::{CapturePipeline, PipelineSettings};
use super::{MediaDevices, VideoFeed};
use crate::config::RecorderConfig;
use crate::encode::{EncoderFactory, EncoderSettings};
use crate::error::{OrbitError, Result, ResultExt};
use crate::platform::{suggested_file_name, SaveTarget};
use crate::session::{CaptureEvent, FailureKind};
use crate::surface::{RecordingRequest, SurfaceMessage};
use crate::types::Handle;

struct Preview {
    /// `None` when the system default camera was opened
    camera_id: Option<String>,
    feed: VideoFeed,
}

struct ActiveRecording {
    session: Handle,
    pipeline: CapturePipeline,
}

/// Capture side of a recording session
pub struct CaptureAgent {
    media: Arc<dyn MediaDevices>,
    encoders: Arc<dyn EncoderFactory>,
    saver: Arc<dyn SaveTarget>,
    config: RecorderConfig,
    events: mpsc::UnboundedSender<CaptureEvent>,
    preview: Option<Preview>,
    recording: Option<ActiveRecording>,
}

impl CaptureAgent {
    /// Create an agent and the receiving end of its event stream
    pub fn new(
        media: Arc<dyn MediaDevices>,
        encoders: Arc<dyn EncoderFactory>,
        saver: Arc<dyn SaveTarget>,
        config: RecorderConfig,
    ) -> (Self, mpsc::UnboundedReceiver<CaptureEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let agent = Self {
            media,
            encoders,
            saver,
            config,
            events,
            preview: None,
            recording: None,
        };
        (agent, events_rx)
    }

    /// Camera preview feed, if one is open
    pub fn preview(&self) -> Option<&VideoFeed> {
        self.preview.as_ref().map(|p| &p.feed)
    }

    pub fn preview_camera(&self) -> Option<&str> {
        self.preview.as_ref().and_then(|p| p.camera_id.as_deref())
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Session currently being recorded
    pub fn recording_session(&self) -> Option<Handle> {
        self.recording.as_ref().map(|r| r.session)
    }

    /// Process messages until the channel closes.
    ///
    /// A pipeline that stops on its own (encoder or source failure) is
    /// collected and saved without waiting for a stop message.
    pub async fn run(mut self, mut messages: mpsc::Receiver<SurfaceMessage>) {
        loop {
            tokio::select! {
                message = messages.recv() => match message {
                    Some(message) => self.handle_message(message).await,
                    None => break,
                },
                _ = pipeline_stopped(&mut self.recording) => {
                    warn!("Capture pipeline stopped on its own");
                    self.finish_recording().await;
                }
            }
        }

        debug!("Capture agent channel closed");
        self.finish_recording().await;
        self.preview = None;
    }

    /// Handle one message from the controller
    pub async fn handle_message(&mut self, message: SurfaceMessage) {
        trace!("Capture agent received {}", message.name());
        match message {
            SurfaceMessage::StartPreview { camera_id } => self.start_preview(camera_id).await,
            SurfaceMessage::StartCamera { session, camera_id } => {
                self.start_camera(session, camera_id).await
            }
            SurfaceMessage::StartRecording(request) => self.start_recording(request).await,
            SurfaceMessage::PauseRecording { session } => {
                if let Some(active) = self.active(session) {
                    active.pipeline.pause();
                    self.emit(CaptureEvent::Paused { session });
                }
            }
            SurfaceMessage::ResumeRecording { session } => {
                if let Some(active) = self.active(session) {
                    active.pipeline.resume();
                    self.emit(CaptureEvent::Resumed { session });
                }
            }
            SurfaceMessage::StopRecording { session } => {
                if self.active(session).is_some() {
                    self.finish_recording().await;
                }
            }
            SurfaceMessage::OverlayMoved { session, overlay } => {
                if let Some(active) = self.active(session) {
                    active.pipeline.move_overlay(overlay);
                }
            }
            SurfaceMessage::ControlsClosing => {
                self.finish_recording().await;
                if self.preview.take().is_some() {
                    info!("Camera preview released");
                }
            }
            other => trace!("Ignoring {} in the capture agent", other.name()),
        }
    }

    async fn start_preview(&mut self, camera_id: Option<String>) {
        if self.recording.is_some() {
            debug!("Preview request ignored while recording");
            return;
        }

        match self.media.open_camera(camera_id.as_deref()).await {
            Ok(feed) => {
                info!("Camera preview started ({})", camera_id.as_deref().unwrap_or("default"));
                self.preview = Some(Preview { camera_id, feed });
                self.emit(CaptureEvent::PreviewStarted);
            }
            Err(e) => {
                warn!("Camera preview failed: {}", e);
                self.preview = None;
                self.emit(CaptureEvent::Failed {
                    session: None,
                    kind: FailureKind::Device,
                    reason: e.detail(),
                    saved: None,
                });
            }
        }
    }

    async fn start_camera(&mut self, session: Handle, camera_id: String) {
        if self.preview_camera() == Some(camera_id.as_str()) {
            self.emit(CaptureEvent::CameraReady { session });
            return;
        }

        match self.media.open_camera(Some(&camera_id)).await {
            Ok(feed) => {
                debug!("Camera {} ready for {}", camera_id, session);
                self.preview = Some(Preview {
                    camera_id: Some(camera_id),
                    feed,
                });
                self.emit(CaptureEvent::CameraReady { session });
            }
            Err(e) => {
                warn!("Camera {} failed for {}: {}", camera_id, session, e);
                self.emit(CaptureEvent::CameraFailed {
                    session,
                    reason: e.detail(),
                });
            }
        }
    }

    async fn start_recording(&mut self, request: RecordingRequest) {
        let session = request.session;
        if let Some(active) = &self.recording {
            warn!(
                "Start for {} ignored, {} is still recording",
                session, active.session
            );
            return;
        }

        match self.open_pipeline(&request).await {
            Ok(pipeline) => {
                info!("Recording {} from {}", session, request.source);
                self.recording = Some(ActiveRecording { session, pipeline });
                self.emit(CaptureEvent::RecordingStarted { session });
            }
            Err(e) => {
                error!("Failed to start recording {}: {}", session, e);
                self.emit(CaptureEvent::Failed {
                    session: Some(session),
                    kind: FailureKind::of(&e),
                    reason: e.detail(),
                    saved: None,
                });
            }
        }
    }

    async fn open_pipeline(&mut self, request: &RecordingRequest) -> Result<CapturePipeline> {
        let screen = self
            .media
            .open_screen(&request.source)
            .await
            .context(format!("Opening {}", request.source))?;

        let camera = match &self.preview {
            Some(preview) if preview.camera_id.as_deref() == Some(request.camera_id.as_str()) => {
                Some(preview.feed.clone())
            }
            _ => match self.media.open_camera(Some(&request.camera_id)).await {
                Ok(feed) => {
                    self.preview = Some(Preview {
                        camera_id: Some(request.camera_id.clone()),
                        feed: feed.clone(),
                    });
                    Some(feed)
                }
                Err(e) => {
                    warn!("Recording without camera overlay: {}", e);
                    None
                }
            },
        };

        let audio = self
            .media
            .open_microphone(&request.mic_id)
            .await
            .context(format!("Opening microphone {}", request.mic_id))?;

        let size = screen
            .borrow()
            .as_ref()
            .map(|frame| frame.size())
            .filter(|size| !size.is_empty())
            .unwrap_or(request.target_size);

        let encoder_settings = EncoderSettings::from_config(&self.config, size);
        debug!(
            "Encoder: {} {} at {}fps, {}kbps",
            encoder_settings.mime(),
            size,
            encoder_settings.fps,
            encoder_settings.video_bitrate
        );
        let encoder = self.encoders.create(&encoder_settings)?;

        let settings = PipelineSettings {
            fps: self.config.fps,
            overlay: request.overlay,
            target_size: request.target_size,
        };
        Ok(CapturePipeline::start(settings, screen, camera, audio, encoder))
    }

    /// Stop the pipeline, finalize and save. No-op when not recording.
    async fn finish_recording(&mut self) {
        let Some(active) = self.recording.take() else {
            return;
        };
        let session = active.session;
        let outcome = active.pipeline.stop().await;
        info!("{} stopped after {} frames", session, outcome.frames);

        let name = suggested_file_name(self.config.container.ext(), SystemTime::now());

        let event = match (outcome.output, outcome.error) {
            (Some(data), None) => match self.save(&name, data).await {
                Ok(Some(path)) => CaptureEvent::Saved { session, path },
                Ok(None) => CaptureEvent::SaveCancelled { session },
                Err(e) => {
                    error!("Failed to save {}: {}", name, e);
                    CaptureEvent::Failed {
                        session: Some(session),
                        kind: FailureKind::Save,
                        reason: e.detail(),
                        saved: None,
                    }
                }
            },
            (Some(data), Some(failure)) => {
                let saved = match self.save(&name, data).await {
                    Ok(path) => path,
                    Err(e) => {
                        error!("Partial recording could not be saved: {}", e);
                        None
                    }
                };
                CaptureEvent::Failed {
                    session: Some(session),
                    kind: FailureKind::of(&failure),
                    reason: failure.detail(),
                    saved,
                }
            }
            (None, failure) => {
                let failure = failure
                    .unwrap_or_else(|| OrbitError::encode("encoder produced no output"));
                CaptureEvent::Failed {
                    session: Some(session),
                    kind: FailureKind::of(&failure),
                    reason: failure.detail(),
                    saved: None,
                }
            }
        };

        self.emit(event);
    }

    async fn save(&self, name: &str, data: Bytes) -> Result<Option<PathBuf>> {
        let Some(path) = self.saver.prompt_save_path(name).await else {
            info!("Save of {} cancelled", name);
            return Ok(None);
        };
        let len = data.len();
        self.saver.write_file(&path, data).await?;
        info!("Saved {} bytes to {:?}", len, path);
        Ok(Some(path))
    }

    /// The running recording, if it belongs to `session`
    fn active(&self, session: Handle) -> Option<&ActiveRecording> {
        match &self.recording {
            Some(active) if active.session == session => Some(active),
            Some(active) => {
                debug!("Ignoring message for {}, recording {}", session, active.session);
                None
            }
            None => {
                debug!("Ignoring message for {}, not recording", session);
                None
            }
        }
    }

    fn emit(&self, event: CaptureEvent) {
        if self.events.send(event).is_err() {
            debug!("Capture event dropped, nobody is listening");
        }
    }
}

async fn pipeline_stopped(recording: &mut Option<ActiveRecording>) {
    match recording {
        Some(active) => active.pipeline.stopped().await,
        None => std::future::pending().await,
    }
}
