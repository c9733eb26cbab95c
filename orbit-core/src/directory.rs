//! Capture source and media device directory
//!
//! Holds the latest snapshot of selectable windows/screens and
//! cameras/microphones. Enumeration itself is done by a
//! [`DirectoryProvider`]; failures there never propagate past this module,
//! they only produce an empty listing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{CaptureSource, MediaDeviceDescriptor, MediaDeviceKind, SourceId};

/// Platform enumeration of sources and devices
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    /// List windows and screens that can be captured
    async fn list_capture_sources(&self) -> Result<Vec<CaptureSource>>;

    /// List cameras and microphones
    async fn list_media_devices(&self) -> Result<Vec<MediaDeviceDescriptor>>;
}

/// Immutable listing produced by one refresh
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    sources: Vec<CaptureSource>,
    devices: Vec<MediaDeviceDescriptor>,
    taken_at: Option<Instant>,
}

impl DirectorySnapshot {
    pub fn new(sources: Vec<CaptureSource>, devices: Vec<MediaDeviceDescriptor>) -> Self {
        Self {
            sources,
            devices,
            taken_at: Some(Instant::now()),
        }
    }

    pub fn sources(&self) -> &[CaptureSource] {
        &self.sources
    }

    pub fn devices(&self) -> &[MediaDeviceDescriptor] {
        &self.devices
    }

    /// When this snapshot was taken (`None` before the first refresh)
    pub fn taken_at(&self) -> Option<Instant> {
        self.taken_at
    }

    pub fn find_source(&self, id: &SourceId) -> Option<&CaptureSource> {
        self.sources.iter().find(|s| &s.id == id)
    }

    pub fn devices_of(&self, kind: MediaDeviceKind) -> impl Iterator<Item = &MediaDeviceDescriptor> {
        self.devices.iter().filter(move |d| d.kind == kind)
    }

    pub fn cameras(&self) -> Vec<MediaDeviceDescriptor> {
        self.devices_of(MediaDeviceKind::Camera).cloned().collect()
    }

    pub fn microphones(&self) -> Vec<MediaDeviceDescriptor> {
        self.devices_of(MediaDeviceKind::Microphone).cloned().collect()
    }

    /// First device of a kind, used as the default selection
    pub fn default_device(&self, kind: MediaDeviceKind) -> Option<&MediaDeviceDescriptor> {
        self.devices_of(kind).next()
    }
}

/// Directory that refreshes its snapshot on demand
pub struct SourceDirectory {
    provider: Arc<dyn DirectoryProvider>,
    snapshot: Arc<DirectorySnapshot>,
}

impl SourceDirectory {
    pub fn new(provider: Arc<dyn DirectoryProvider>) -> Self {
        Self {
            provider,
            snapshot: Arc::new(DirectorySnapshot::default()),
        }
    }

    /// The latest snapshot (empty before the first refresh)
    pub fn snapshot(&self) -> Arc<DirectorySnapshot> {
        self.snapshot.clone()
    }

    /// Re-enumerate sources and devices.
    ///
    /// A failing half of the enumeration yields an empty list for that half.
    pub async fn refresh(&mut self) -> Arc<DirectorySnapshot> {
        let sources = match self.provider.list_capture_sources().await {
            Ok(sources) => sources,
            Err(e) => {
                warn!("Failed to list capture sources: {}", e);
                Vec::new()
            }
        };

        let devices = match self.provider.list_media_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                warn!("Failed to list media devices: {}", e);
                Vec::new()
            }
        };

        debug!(
            "Directory refreshed: {} sources, {} devices",
            sources.len(),
            devices.len()
        );

        self.snapshot = Arc::new(DirectorySnapshot::new(sources, devices));
        self.snapshot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrbitError;

    struct FlakyProvider;

    #[async_trait]
    impl DirectoryProvider for FlakyProvider {
        async fn list_capture_sources(&self) -> Result<Vec<CaptureSource>> {
            Ok(vec![CaptureSource::new("screen:1:0", "Entire Screen")])
        }

        async fn list_media_devices(&self) -> Result<Vec<MediaDeviceDescriptor>> {
            Err(OrbitError::permission("media devices"))
        }
    }

    #[tokio::test]
    async fn test_refresh_degrades_to_empty() {
        let mut directory = SourceDirectory::new(Arc::new(FlakyProvider));
        let snapshot = directory.refresh().await;
        assert_eq!(snapshot.sources().len(), 1);
        assert!(snapshot.devices().is_empty());
        assert!(snapshot.taken_at().is_some());
    }


    #[test]
    fn test_default_device_is_first_of_kind() {
        let snapshot = DirectorySnapshot::new(
            Vec::new(),
            vec![
                MediaDeviceDescriptor::microphone("m1", "Mic"),
                MediaDeviceDescriptor::camera("c1", "Cam A"),
                MediaDeviceDescriptor::camera("c2", "Cam B"),
            ],
        );
        assert_eq!(
            snapshot.default_device(MediaDeviceKind::Camera).map(|d| d.device_id.as_str()),
            Some("c1")
        );
        assert_eq!(snapshot.cameras().len(), 2);
        assert_eq!(snapshot.microphones().len(), 1);
    }
}
