pub mod frame;
pub mod packets;
pub mod result;
pub mod wire;

pub use frame::{FrameHeader, ReadOutcome, PROTOCOL_VERSION};
pub use result::ResultCode;
