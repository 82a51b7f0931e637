//! Network interface and raw frame I/O.

pub mod capture;
pub mod interface;

pub use capture::{CaptureSink, CaptureSource, FrameSink, FrameSource};
pub use interface::InterfaceInfo;
