pub mod device;
pub mod frame;
pub mod sampler;

pub use device::{CameraDevice, ReplayCamera};
pub use frame::{encode_frame, EncodedFrame, FrameCapture};
pub use sampler::FrameSampler;
