//! Audio output path: the sink adapter and the render pump it drives.

pub mod pump;
pub mod sink;

pub use pump::{RenderPump, NUM_BUFFERS};
pub use sink::{AudioSink, PcmFormat, RodioSink};
