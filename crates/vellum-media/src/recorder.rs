//! The media recorder: `idle → recording → reviewing → (saved | discarded)`.
//!
//! Device access sits behind a trait so the state machine is testable
//! without hardware. Every exit path releases the capture stream and, on
//! discard, revokes the clip's blob URL.

use std::collections::HashMap;

use thiserror::Error;

use crate::waveform::Waveform;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture permission denied")]
    PermissionDenied,
    #[error("capture device unavailable: {0}")]
    Unavailable(String),
}

/// A live capture session handing back PCM samples.
pub trait CaptureStream: Send {
    fn read_samples(&mut self) -> Vec<f32>;
}

/// Device acquisition, including the user permission step. Denial is
/// reported, never retried automatically.
pub trait CaptureDevice: Send {
    fn acquire(&mut self) -> Result<Box<dyn CaptureStream>, CaptureError>;
}

/// Local blob registry standing in for object-URL management. A clip's URL
/// stays resolvable until revoked.
#[derive(Debug, Default)]
pub struct BlobStore {
    next: u64,
    blobs: HashMap<String, Vec<u8>>,
}

impl BlobStore {
    pub fn create(&mut self, bytes: Vec<u8>) -> String {
        self.next += 1;
        let url = format!("blob:vellum/{}", self.next);
        self.blobs.insert(url.clone(), bytes);
        url
    }

    pub fn revoke(&mut self, url: &str) {
        self.blobs.remove(url);
    }

    pub fn get(&self, url: &str) -> Option<&[u8]> {
        self.blobs.get(url).map(|b| b.as_slice())
    }

    pub fn is_registered(&self, url: &str) -> bool {
        self.blobs.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderPhase {
    Idle,
    Recording,
    Reviewing,
}

/// A stopped recording under review: playable blob URL plus its waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub url: String,
    pub waveform: Waveform,
    pub duration_secs: u32,
}

/// What `save` hands to the document: the audio bytes and the URL that
/// becomes the inserted audio node's `src`.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedClip {
    pub blob: Vec<u8>,
    pub url: String,
    pub duration_secs: u32,
}

pub struct Recorder {
    device: Box<dyn CaptureDevice>,
    blobs: BlobStore,
    phase: RecorderPhase,
    stream: Option<Box<dyn CaptureStream>>,
    samples: Vec<f32>,
    elapsed_secs: u32,
    clip: Option<Clip>,
    error: Option<String>,
    waveform_buckets: usize,
}

impl Recorder {
    pub fn new(device: Box<dyn CaptureDevice>) -> Self {
        Self {
            device,
            blobs: BlobStore::default(),
            phase: RecorderPhase::Idle,
            stream: None,
            samples: Vec::new(),
            elapsed_secs: 0,
            clip: None,
            error: None,
            waveform_buckets: 64,
        }
    }

    pub fn phase(&self) -> RecorderPhase {
        self.phase
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    /// The inline error shown when device acquisition fails.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Begin recording. A clip still under review is discarded first, so no
    /// blob URL is left dangling.
    pub fn start(&mut self) -> bool {
        if self.phase == RecorderPhase::Recording {
            return false;
        }
        if self.phase == RecorderPhase::Reviewing {
            self.discard();
        }

        match self.device.acquire() {
            Ok(stream) => {
                self.stream = Some(stream);
                self.samples.clear();
                self.elapsed_secs = 0;
                self.error = None;
                self.phase = RecorderPhase::Recording;
                log::debug!("recorder: recording started");
                true
            }
            Err(err) => {
                log::warn!("recorder: device acquisition failed: {err}");
                self.error = Some(err.to_string());
                self.phase = RecorderPhase::Idle;
                false
            }
        }
    }

    /// One second of recording time: bump the counter and pull samples.
    pub fn tick(&mut self) {
        if self.phase != RecorderPhase::Recording {
            return;
        }
        self.elapsed_secs += 1;
        if let Some(stream) = &mut self.stream {
            self.samples.extend(stream.read_samples());
        }
    }

    /// Stop recording and move to review: blob, URL, and waveform.
    pub fn stop(&mut self) {
        if self.phase != RecorderPhase::Recording {
            return;
        }
        if let Some(mut stream) = self.stream.take() {
            self.samples.extend(stream.read_samples());
        }

        let bytes: Vec<u8> = self
            .samples
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let url = self.blobs.create(bytes);
        let waveform = Waveform::from_samples(&self.samples, self.waveform_buckets);

        self.clip = Some(Clip {
            url,
            waveform,
            duration_secs: self.elapsed_secs,
        });
        self.samples.clear();
        self.phase = RecorderPhase::Reviewing;
        log::debug!("recorder: reviewing {}s clip", self.elapsed_secs);
    }

    /// Throw the current state away and return to idle. Releases the stream
    /// if recording, revokes the clip URL if reviewing.
    pub fn discard(&mut self) {
        self.stream = None;
        self.samples.clear();
        if let Some(clip) = self.clip.take() {
            self.blobs.revoke(&clip.url);
        }
        self.elapsed_secs = 0;
        self.phase = RecorderPhase::Idle;
    }

    /// Hand the reviewed clip to the caller for insertion as an audio node.
    /// Returns `None` outside review, so a save can only happen once per
    /// clip. The blob URL stays registered — the document owns it now.
    pub fn save(&mut self) -> Option<SavedClip> {
        if self.phase != RecorderPhase::Reviewing {
            return None;
        }
        let clip = self.clip.take()?;
        let blob = self.blobs.get(&clip.url)?.to_vec();
        self.elapsed_secs = 0;
        self.phase = RecorderPhase::Idle;
        log::debug!("recorder: saved {}s clip as {}", clip.duration_secs, clip.url);
        Some(SavedClip {
            blob,
            url: clip.url,
            duration_secs: clip.duration_secs,
        })
    }

    /// Modal visibility. Hiding mid-recording force-stops and cleans up as
    /// a discard; hiding while idle is a no-op.
    pub fn set_visible(&mut self, visible: bool) {
        if !visible && self.phase == RecorderPhase::Recording {
            log::debug!("recorder: hidden while recording, discarding");
            self.discard();
        }
    }

    /// Component teardown: release every held resource.
    pub fn teardown(&mut self) {
        self.discard();
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.teardown();
    }
}
