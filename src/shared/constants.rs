/// Unapproved videos shown per page of the approve/reject queue
pub const APPROVE_QUEUE_PAGE_SIZE: usize = 10;

/// Feeds and saved searches shown per page of the source manager
pub const SOURCES_PAGE_SIZE: usize = 10;

/// Videos shown per page of the bulk editor
pub const BULK_EDIT_PAGE_SIZE: usize = 50;

/// Longest tag accepted on a video
pub const MAX_TAG_LENGTH: usize = 50;

/// Longest feed or video name
pub const MAX_NAME_LENGTH: usize = 250;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Superuser role - administers every site
pub const ROLE_SUPERUSER: &str = "superuser";

/// Site admin role - curates videos, sources and categories of this site
pub const ROLE_SITE_ADMIN: &str = "site_admin";
