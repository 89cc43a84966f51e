pub mod assist;
pub mod inline_edit;
pub mod link_card;
pub mod node_state;
pub mod recorder;
pub mod resize;
pub mod waveform;

pub use crate::node_state::{NodeId, NodeStateTable};
pub use crate::recorder::{
    BlobStore, CaptureDevice, CaptureError, CaptureStream, Clip, Recorder, RecorderPhase,
    SavedClip,
};
pub use crate::resize::{
    BoundingBox, MIN_MEDIA_DIMENSION, ResizeDrag, SelectionLockGuard, SelectionLockState,
    dimension_patch,
};
pub use crate::waveform::Waveform;
