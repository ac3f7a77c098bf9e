mod video_formset;
mod video_links;
mod video_listing;
mod video_service;

pub use video_links::{replace_video_links, VideoRelation};
pub use video_service::{Moderation, VideoService};
