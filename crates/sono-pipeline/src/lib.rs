// Streaming windowing, cross-thread handoff, and pipeline assembly for sonoscope.

pub mod dispatch;
pub mod pipeline;
pub mod sink;
pub mod window;

mod worker;

pub use dispatch::FrameDispatcher;
pub use pipeline::{Pipeline, PipelineStats};
pub use sink::ChannelSink;
pub use window::WindowBuffer;
