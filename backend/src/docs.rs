#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    handlers::{admin::profile::UpdateProfileRequest, content::LocaleQuery},
    models::{
        blog::{BlogPost, UpsertPostRequest},
        content::{ContentBlock, ContentUpsertRequest},
        integration::{
            GithubConnectRequest, IntegrationStatus, LinkedinConnectRequest, Provider,
        },
        user::{
            LoginRequest, LoginResponse, RealtimeTokenResponse, SessionEnvelope, UserResponse,
        },
    },
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        login_doc,
        logout_doc,
        session_doc,
        realtime_doc,
        profile_doc,
        get_content_doc,
        list_content_doc,
        list_blog_doc,
        get_blog_post_doc,
        admin_upsert_content_doc,
        admin_list_blog_doc,
        admin_create_post_doc,
        admin_update_post_doc,
        admin_delete_post_doc,
        admin_update_profile_doc,
        github_status_doc,
        github_connect_doc,
        github_disconnect_doc,
        linkedin_status_doc,
        linkedin_connect_doc,
        linkedin_disconnect_doc,
        linkedin_sync_doc
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            SessionEnvelope,
            RealtimeTokenResponse,
            UserResponse,
            UpdateProfileRequest,
            ContentBlock,
            ContentUpsertRequest,
            BlogPost,
            UpsertPostRequest,
            Provider,
            GithubConnectRequest,
            LinkedinConnectRequest,
            IntegrationStatus
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "Login, logout, session probe"),
        (name = "Content", description = "Public content blocks and blog"),
        (name = "Admin", description = "Admin CRUD and integrations")
    )
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("folio_session"))),
        );
        components.add_security_scheme(
            "CsrfHeader",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-csrf-token"))),
        );
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body(content = LoginRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Session created", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many attempts")
    ),
    tag = "Auth"
)]
fn login_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Session destroyed, cookies cleared")),
    tag = "Auth"
)]
fn logout_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses((status = 200, body = SessionEnvelope)),
    tag = "Auth"
)]
fn session_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/realtime",
    responses((status = 200, body = RealtimeTokenResponse), (status = 401, description = "No session")),
    tag = "Auth",
    security(("SessionCookie" = []))
)]
fn realtime_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses((status = 200, body = UserResponse)),
    tag = "Auth",
    security(("SessionCookie" = []))
)]
fn profile_doc() {}

#[utoipa::path(
    get,
    path = "/api/content/{slug}",
    params(("slug" = String, Path), LocaleQuery),
    responses((status = 200, body = ContentBlock), (status = 404, description = "Unknown slug")),
    tag = "Content"
)]
fn get_content_doc() {}

#[utoipa::path(
    get,
    path = "/api/content",
    params(LocaleQuery),
    responses((status = 200, body = [ContentBlock])),
    tag = "Content"
)]
fn list_content_doc() {}

#[utoipa::path(
    get,
    path = "/api/blog",
    responses((status = 200, body = [BlogPost])),
    tag = "Content"
)]
fn list_blog_doc() {}

#[utoipa::path(
    get,
    path = "/api/blog/{slug}",
    params(("slug" = String, Path)),
    responses((status = 200, body = BlogPost), (status = 404, description = "Unknown or draft")),
    tag = "Content"
)]
fn get_blog_post_doc() {}

#[utoipa::path(
    put,
    path = "/api/admin/content/{slug}/{locale}",
    params(("slug" = String, Path), ("locale" = String, Path)),
    request_body = ContentUpsertRequest,
    responses((status = 200, body = ContentBlock), (status = 400, description = "Schema violation")),
    tag = "Admin",
    security(("SessionCookie" = [], "CsrfHeader" = []))
)]
fn admin_upsert_content_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/blog",
    responses((status = 200, body = [BlogPost])),
    tag = "Admin",
    security(("SessionCookie" = []))
)]
fn admin_list_blog_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/blog",
    request_body = UpsertPostRequest,
    responses((status = 200, body = BlogPost)),
    tag = "Admin",
    security(("SessionCookie" = [], "CsrfHeader" = []))
)]
fn admin_create_post_doc() {}

#[utoipa::path(
    put,
    path = "/api/admin/blog/{slug}",
    params(("slug" = String, Path)),
    request_body = UpsertPostRequest,
    responses((status = 200, body = BlogPost)),
    tag = "Admin",
    security(("SessionCookie" = [], "CsrfHeader" = []))
)]
fn admin_update_post_doc() {}

#[utoipa::path(
    delete,
    path = "/api/admin/blog/{slug}",
    params(("slug" = String, Path)),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Unknown slug")),
    tag = "Admin",
    security(("SessionCookie" = [], "CsrfHeader" = []))
)]
fn admin_delete_post_doc() {}

#[utoipa::path(
    put,
    path = "/api/admin/profile",
    request_body = UpdateProfileRequest,
    responses((status = 200, body = UserResponse)),
    tag = "Admin",
    security(("SessionCookie" = [], "CsrfHeader" = []))
)]
fn admin_update_profile_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/integrations/github",
    responses((status = 200, body = IntegrationStatus)),
    tag = "Admin",
    security(("SessionCookie" = []))
)]
fn github_status_doc() {}

#[utoipa::path(
    put,
    path = "/api/admin/integrations/github",
    request_body = GithubConnectRequest,
    responses(
        (status = 200, body = IntegrationStatus),
        (status = 400, description = "Provider rejected the credentials")
    ),
    tag = "Admin",
    security(("SessionCookie" = [], "CsrfHeader" = []))
)]
fn github_connect_doc() {}

#[utoipa::path(
    delete,
    path = "/api/admin/integrations/github",
    responses((status = 200, description = "Disconnected")),
    tag = "Admin",
    security(("SessionCookie" = [], "CsrfHeader" = []))
)]
fn github_disconnect_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/integrations/linkedin",
    responses((status = 200, body = IntegrationStatus)),
    tag = "Admin",
    security(("SessionCookie" = []))
)]
fn linkedin_status_doc() {}

#[utoipa::path(
    put,
    path = "/api/admin/integrations/linkedin",
    request_body = LinkedinConnectRequest,
    responses((status = 200, body = IntegrationStatus)),
    tag = "Admin",
    security(("SessionCookie" = [], "CsrfHeader" = []))
)]
fn linkedin_connect_doc() {}

#[utoipa::path(
    delete,
    path = "/api/admin/integrations/linkedin",
    responses((status = 200, description = "Disconnected")),
    tag = "Admin",
    security(("SessionCookie" = [], "CsrfHeader" = []))
)]
fn linkedin_disconnect_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/integrations/linkedin/sync",
    responses((status = 200, body = IntegrationStatus)),
    tag = "Admin",
    security(("SessionCookie" = [], "CsrfHeader" = []))
)]
fn linkedin_sync_doc() {}
