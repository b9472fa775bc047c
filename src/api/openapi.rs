use super::handlers::{health, issue};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(issue::issue, health::health),
    components(schemas(issue::IssueRequest, issue::IssueResponse, health::Health)),
    tags(
        (name = "issue", description = "Verification PIN issuance"),
        (name = "health", description = "Service and database health"),
    )
)]
struct ApiDoc;

/// `OpenAPI` document for every served route. Title and version come from Cargo.toml.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
