pub mod codec;
pub mod mock;
pub mod registry;
pub mod tcp;
pub mod traits;

pub use codec::{encode_frame, read_frame, write_frame};
pub use registry::SourceRegistry;
pub use tcp::TcpSource;
pub use traits::{split_address, FrameSource};
