mod video;

pub use video::{Video, VideoStatus};
