use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::authors::{dtos as authors_dtos, handlers as authors_handlers};
use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::feeds::{
    dtos as feeds_dtos, handlers as feeds_handlers, models as feeds_models,
};
use crate::features::sources::{
    dtos as sources_dtos, handlers as sources_handlers, models as sources_models,
};
use crate::features::videos::{
    dtos as videos_dtos, handlers as videos_handlers, models as videos_models,
};
use crate::shared::pagination::{PageLinks, PageWindow};
use crate::shared::sorting::SortHeader;
use crate::shared::types::{ApiResponse, FieldError, FormErrors, Listing, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handler::get_me,
        // Categories
        categories_handlers::list_categories,
        categories_handlers::create_category,
        categories_handlers::save_categories,
        // Authors
        authors_handlers::list_authors,
        authors_handlers::create_author,
        // Sources
        sources_handlers::list_sources,
        sources_handlers::save_sources,
        sources_handlers::edit_feed,
        sources_handlers::enable_feed_auto_approve,
        sources_handlers::disable_feed_auto_approve,
        sources_handlers::enable_search_auto_approve,
        sources_handlers::disable_search_auto_approve,
        sources_handlers::create_search,
        // Feeds
        feeds_handlers::register_feed,
        feeds_handlers::get_import_job,
        // Videos
        videos_handlers::approve_queue,
        videos_handlers::preview_video,
        videos_handlers::approve_video,
        videos_handlers::reject_video,
        videos_handlers::feature_video,
        videos_handlers::unfeature_video,
        videos_handlers::approve_all,
        videos_handlers::reject_all,
        videos_handlers::clear_all_preview,
        videos_handlers::clear_all,
        videos_handlers::bulk_edit_listing,
        videos_handlers::save_bulk_edit,
        videos_handlers::edit_video,
    ),
    components(
        schemas(
            // Shared
            Meta,
            FieldError,
            FormErrors,
            PageWindow,
            PageLinks,
            SortHeader,
            // Auth
            auth::dto::MeResponseDto,
            ApiResponse<auth::dto::MeResponseDto>,
            // Categories
            categories_dtos::CategoryResponseDto,
            categories_dtos::CategoryTreeDto,
            categories_dtos::CategoryListDto,
            categories_dtos::CreateCategoryDto,
            categories_dtos::CategoryRowDto,
            categories_dtos::CategoryBulkAction,
            categories_dtos::CategoryFormsetDto,
            categories_dtos::CategoryFormsetResultDto,
            ApiResponse<categories_dtos::CategoryListDto>,
            // Authors
            authors_dtos::AuthorResponseDto,
            authors_dtos::CreateAuthorDto,
            ApiResponse<Vec<authors_dtos::AuthorResponseDto>>,
            // Sources
            sources_models::SourceKind,
            sources_models::FeedStatus,
            sources_dtos::SourceResponseDto,
            sources_dtos::SourceRowDto,
            sources_dtos::SourceBulkFormDto,
            sources_dtos::SourceBulkAction,
            sources_dtos::SourceFormsetDto,
            sources_dtos::SourceFormsetResultDto,
            sources_dtos::CreateSavedSearchDto,
            sources_dtos::FeedEditDto,
            Listing<sources_dtos::SourceResponseDto>,
            // Feeds
            feeds_models::ImportJobStatus,
            feeds_dtos::CreateFeedDto,
            feeds_dtos::ImportJobResponseDto,
            feeds_dtos::FeedRegistrationDto,
            ApiResponse<feeds_dtos::ImportJobResponseDto>,
            // Videos
            videos_models::VideoStatus,
            videos_dtos::VideoResponseDto,
            videos_dtos::ApproveQueueDto,
            videos_dtos::ClearAllDto,
            videos_dtos::ModerationResultDto,
            videos_dtos::VideoRowDto,
            videos_dtos::VideoBulkFormDto,
            videos_dtos::VideoBulkAction,
            videos_dtos::VideoFormsetDto,
            videos_dtos::VideoFormsetResultDto,
            videos_dtos::VideoEditDto,
            Listing<videos_dtos::VideoResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Current administrator"),
        (name = "categories", description = "Category tree editor"),
        (name = "authors", description = "Video authors"),
        (name = "sources", description = "Feeds and saved searches"),
        (name = "feeds", description = "Feed registration and import jobs"),
        (name = "videos", description = "Approve/reject queue and bulk edit"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Miro Community Admin API",
        version = "0.1.0",
        description = "Administrative back-office for Miro Community sites",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_paths_are_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/me",
            "/api/admin/categories/bulk",
            "/api/admin/sources",
            "/api/admin/feeds",
            "/api/admin/approve-reject/clear-all",
            "/api/admin/bulk-edit",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_info_modifier_overrides_title() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Site admin".to_string(),
            version: "9.9.9".to_string(),
            description: "custom".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Site admin");
        assert_eq!(doc.info.description.as_deref(), Some("custom"));
    }
}
