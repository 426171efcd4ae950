//! API route configuration.

use axum::Router;
use axum::routing::{delete, get, post, put};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable};

use super::state::AppState;
use super::system::{self, HealthResponse};
use super::v1::{
    self, AvailableUserResponse, AvailableUsersResponse, ChangeRoleRequest, ChangedRoleResponse,
    CreateItemRequest, ErrorResponse, ItemResponse, LoginRequest, LoginResponse, MessageResponse,
    PaginatedItems, RegisterRequest, ResponseStatus, ShareItemRequest, SingleItemResponse,
    SingleUserResponse, UpdateItemRequest, UpdatedItemResponse, UserResponse, UsersResponse,
};
use crate::db::Database;

/// Build routes with generic database type.
///
/// This macro reduces boilerplate when registering handlers that are generic
/// over the Database trait. It applies the turbofish operator automatically.
macro_rules! routes {
    ($D:ty => {
        $($method:ident $path:literal => $($handler:ident)::+),* $(,)?
    }) => {{
        let router = Router::new();
        $(
            let router = router.route($path, $method($($handler)::+::<$D>));
        )*
        router
    }};
}

/// Registers the bearer session scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "To-do List API",
        version = "0.1.0",
        description = "Multi-user to-do lists with tagging, sharing and version-checked updates",
        license(name = "GPL-2.0")
    ),
    paths(
        system::root,
        system::health,
        v1::register,
        v1::login,
        v1::logout,
        v1::list_items,
        v1::get_item,
        v1::create_item,
        v1::update_item,
        v1::delete_item,
        v1::share_item,
        v1::available_users,
        v1::list_users,
        v1::get_user,
        v1::change_role,
    ),
    components(
        schemas(
            HealthResponse,
            ResponseStatus,
            ErrorResponse,
            MessageResponse,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            ItemResponse,
            SingleItemResponse,
            PaginatedItems,
            CreateItemRequest,
            UpdateItemRequest,
            UpdatedItemResponse,
            ShareItemRequest,
            AvailableUserResponse,
            AvailableUsersResponse,
            UserResponse,
            UsersResponse,
            SingleUserResponse,
            ChangeRoleRequest,
            ChangedRoleResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "authentication", description = "Registration and sessions"),
        (name = "todo-items", description = "To-do items, tags and sharing"),
        (name = "users", description = "User administration (admin only)")
    )
)]
pub struct ApiDoc;

/// Create the API router with OpenAPI documentation
pub fn create_router<D: Database + 'static>(state: AppState<D>) -> Router {
    let api = ApiDoc::openapi();

    // System routes (non-generic)
    let system_routes = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health));

    let auth_routes = routes!(D => {
        post "/api/v1/authentication/register" => v1::register,
        post "/api/v1/authentication/login" => v1::login,
        post "/api/v1/authentication/logout" => v1::logout,
    });

    let item_routes = routes!(D => {
        get "/api/v1/todo-items" => v1::list_items,
        post "/api/v1/todo-items" => v1::create_item,
        get "/api/v1/todo-items/{id}" => v1::get_item,
        put "/api/v1/todo-items/{id}" => v1::update_item,
        delete "/api/v1/todo-items/{id}" => v1::delete_item,
        put "/api/v1/todo-items/{id}/shares" => v1::share_item,
        get "/api/v1/todo-items/{id}/available-users" => v1::available_users,
    });

    let user_routes = routes!(D => {
        get "/api/v1/users" => v1::list_users,
        get "/api/v1/users/{id}" => v1::get_user,
        put "/api/v1/users/{id}/role" => v1::change_role,
    });

    system_routes
        .merge(auth_routes)
        .merge(item_routes)
        .merge(user_routes)
        .merge(Scalar::with_url("/docs", api))
        .with_state(state)
}
