//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{
    AdminOverview, LotCapacityManager, LotLocks, ReservationLedger, SpotAllocator, UserService,
};
use crate::config::ParkingConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::interfaces::http::modules::metrics::{
    http_metrics_middleware, prometheus_metrics, MetricsState,
};
use crate::interfaces::http::modules::request_id::request_id_middleware;
use crate::interfaces::http::modules::{admin, auth, health, lots, reservations};
use crate::shared::clock::Clock;

/// Application services shared by every handler
#[derive(Clone)]
pub struct ApiServices {
    pub users: Arc<UserService>,
    pub lots: Arc<LotCapacityManager>,
    pub allocator: Arc<SpotAllocator>,
    pub ledger: Arc<ReservationLedger>,
    pub overview: Arc<AdminOverview>,
    pub parking: ParkingConfig,
}

impl ApiServices {
    /// Wire the services over one repository provider. Booking, release and
    /// resizing share the same per-lot locks.
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: Arc<dyn Clock>,
        jwt_config: JwtConfig,
        bcrypt_cost: u32,
        parking: ParkingConfig,
    ) -> Self {
        let locks = LotLocks::new();
        Self {
            users: Arc::new(UserService::new(repos.clone(), jwt_config, bcrypt_cost)),
            lots: Arc::new(LotCapacityManager::new(repos.clone(), locks.clone())),
            allocator: Arc::new(SpotAllocator::new(repos.clone(), locks, clock)),
            ledger: Arc::new(ReservationLedger::new(repos.clone(), parking.monthly_window)),
            overview: Arc::new(AdminOverview::new(repos)),
            parking,
        }
    }
}

/// Router state; each handler extracts its own slice through `FromRef`.
#[derive(Clone, FromRef)]
pub struct ApiState {
    pub auth: AuthState,
    pub auth_handlers: auth::AuthHandlerState,
    pub lots: lots::LotsState,
    pub reservations: reservations::ReservationsState,
    pub admin: admin::AdminState,
    pub health: health::HealthState,
    pub metrics: MetricsState,
}

impl ApiState {
    fn new(services: ApiServices, db: DatabaseConnection, prometheus: PrometheusHandle) -> Self {
        Self {
            auth: AuthState {
                jwt_config: services.users.jwt_config().clone(),
            },
            auth_handlers: auth::AuthHandlerState {
                users: services.users.clone(),
            },
            lots: lots::LotsState {
                lots: services.lots.clone(),
            },
            reservations: reservations::ReservationsState {
                allocator: services.allocator.clone(),
                ledger: services.ledger.clone(),
                history_default_limit: services.parking.history_default_limit,
                history_max_limit: services.parking.history_max_limit,
            },
            admin: admin::AdminState {
                overview: services.overview.clone(),
                users: services.users.clone(),
            },
            health: health::HealthState {
                db,
                started_at: Arc::new(Instant::now()),
            },
            metrics: MetricsState { handle: prometheus },
        }
    }
}

/// Security scheme modifier for OpenAPI
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
                        .description(Some("JWT Bearer token from /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        auth::register,
        auth::get_current_user,
        // Lots
        lots::list_lots,
        lots::list_available_lots,
        lots::occupancy,
        lots::create_lot,
        lots::update_lot,
        lots::resize_lot,
        lots::delete_lot,
        lots::list_spots,
        // Reservations
        reservations::book_spot,
        reservations::release_spot,
        reservations::active_reservations,
        reservations::reservation_history,
        reservations::monthly_usage,
        // Administration
        admin::admin_summary,
        admin::list_users,
        admin::delete_user,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::ComponentHealth,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RegisterRequest,
            auth::UserInfo,
            lots::LotRequest,
            lots::ResizeLotRequest,
            lots::LotResponse,
            lots::LotOccupancyResponse,
            lots::OccupancyEntry,
            lots::SpotResponse,
            reservations::ReservationResponse,
            reservations::ReservationDetailsResponse,
            reservations::MonthlyUsageResponse,
            admin::AdminSummaryResponse,
            admin::UserSummaryResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Authentication", description = "Registration, login (JWT) and profile"),
        (name = "Parking Lots", description = "Lot administration, spot inventory and occupancy"),
        (name = "Reservations", description = "Booking and releasing spots, parking history"),
        (name = "Administration", description = "Dashboard summary and user management"),
    ),
    info(
        title = "ParkHub API",
        version = "1.0.0",
        description = "REST API for parking lot reservations",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(
    services: ApiServices,
    db: DatabaseConnection,
    prometheus: PrometheusHandle,
) -> Router {
    let state = ApiState::new(services, db, prometheus);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(prometheus_metrics))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/register", post(auth::register));

    // Bearer-protected routes; role checks happen in the services
    let protected_routes = Router::new()
        .route("/api/v1/auth/me", get(auth::get_current_user))
        // Lots
        .route("/api/v1/lots", get(lots::list_lots).post(lots::create_lot))
        .route("/api/v1/lots/available", get(lots::list_available_lots))
        .route(
            "/api/v1/lots/{id}",
            put(lots::update_lot).delete(lots::delete_lot),
        )
        .route("/api/v1/lots/{id}/capacity", put(lots::resize_lot))
        .route("/api/v1/lots/{id}/spots", get(lots::list_spots))
        .route("/api/v1/occupancy", get(lots::occupancy))
        // Reservations
        .route("/api/v1/lots/{id}/book", post(reservations::book_spot))
        .route(
            "/api/v1/reservations/{id}/release",
            post(reservations::release_spot),
        )
        .route(
            "/api/v1/reservations/active",
            get(reservations::active_reservations),
        )
        .route(
            "/api/v1/reservations/history",
            get(reservations::reservation_history),
        )
        .route(
            "/api/v1/reservations/monthly",
            get(reservations::monthly_usage),
        )
        // Administration
        .route("/api/v1/admin/summary", get(admin::admin_summary))
        .route("/api/v1/users", get(admin::list_users))
        .route("/api/v1/users/{id}", delete(admin::delete_user))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        // Middleware
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, TimeZone, Utc};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use tower::Service;

    use crate::infrastructure::database::testing::memory_repos;
    use crate::shared::clock::ManualClock;

    struct TestApp {
        router: Router,
        clock: Arc<ManualClock>,
        admin_token: String,
    }

    async fn app() -> TestApp {
        let (db, repos) = memory_repos().await;
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        ));
        let services = ApiServices::new(
            repos,
            clock.clone(),
            JwtConfig::new("router-test-secret", 1),
            4,
            ParkingConfig::default(),
        );
        services
            .users
            .ensure_default_admin("admin", "admin-password")
            .await
            .unwrap();

        let prometheus = PrometheusBuilder::new().build_recorder().handle();
        let router = create_api_router(services, db, prometheus);

        let mut app = TestApp {
            router,
            clock,
            admin_token: String::new(),
        };
        app.admin_token = app.login("admin", "admin-password").await;
        app
    }

    impl TestApp {
        async fn send(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header("authorization", format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let mut svc = self.router.clone().into_service();
            let response = svc.call(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, json)
        }

        async fn login(&self, username: &str, password: &str) -> String {
            let (status, body) = self
                .send(
                    "POST",
                    "/api/v1/auth/login",
                    None,
                    Some(json!({ "username": username, "password": password })),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "{body}");
            body["data"]["token"].as_str().unwrap().to_string()
        }

        async fn driver(&self, username: &str) -> String {
            let (status, body) = self
                .send(
                    "POST",
                    "/api/v1/auth/register",
                    None,
                    Some(json!({
                        "username": username,
                        "password": "driver-password",
                        "email": format!("{}@example.com", username),
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            self.login(username, "driver-password").await
        }

        async fn create_lot(&self, spots: i32) -> i64 {
            let (status, body) = self
                .send(
                    "POST",
                    "/api/v1/lots",
                    Some(&self.admin_token),
                    Some(json!({
                        "prime_location_name": "Central",
                        "price": "10",
                        "address": "12 Station Road",
                        "pin_code": "560001",
                        "maximum_spots": spots,
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["data"]["id"].as_i64().unwrap()
        }
    }

    fn decimal(value: &Value) -> Decimal {
        value.as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = app().await;
        let (status, body) = app.send("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"]["status"], "ok");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = app().await;

        let (status, body) = app.send("GET", "/api/v1/lots", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = app
            .send("GET", "/api/v1/lots", Some("not-a-token"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn roles_are_enforced() {
        let app = app().await;
        let driver = app.driver("alice").await;
        let lot_id = app.create_lot(2).await;

        let (status, _) = app
            .send(
                "PUT",
                &format!("/api/v1/lots/{}/capacity", lot_id),
                Some(&driver),
                Some(json!({ "maximum_spots": 5 })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .send("GET", "/api/v1/admin/summary", Some(&driver), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .send(
                "POST",
                &format!("/api/v1/lots/{}/book", lot_id),
                Some(&app.admin_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn book_then_release_bills_started_hours() {
        let app = app().await;
        let driver = app.driver("alice").await;
        let lot_id = app.create_lot(3).await;

        let (status, body) = app
            .send(
                "POST",
                &format!("/api/v1/lots/{}/book", lot_id),
                Some(&driver),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["status"], "active");
        let reservation_id = body["data"]["id"].as_i64().unwrap();

        let (_, body) = app
            .send("GET", "/api/v1/reservations/active", Some(&driver), None)
            .await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["lot_id"].as_i64(), Some(lot_id));

        let (_, body) = app.send("GET", "/api/v1/occupancy", Some(&driver), None).await;
        assert_eq!(body["data"][0]["occupied"], 1);
        assert_eq!(body["data"][0]["available"], 2);

        app.clock.advance(Duration::minutes(90));
        let release = format!("/api/v1/reservations/{}/release", reservation_id);
        let (status, body) = app.send("POST", &release, Some(&driver), None).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["status"], "completed");
        assert_eq!(decimal(&body["data"]["parking_cost"]), Decimal::from(20));

        let (status, body) = app.send("POST", &release, Some(&driver), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);

        let (_, body) = app
            .send("GET", "/api/v1/reservations/monthly", Some(&driver), None)
            .await;
        assert_eq!(body["data"][0]["month"], "2024-06");
        assert_eq!(body["data"][0]["bookings"], 1);
        assert_eq!(decimal(&body["data"][0]["total_cost"]), Decimal::from(20));
    }

    #[tokio::test]
    async fn full_lot_and_second_booking_conflict() {
        let app = app().await;
        let alice = app.driver("alice").await;
        let bob = app.driver("bob").await;
        let lot_id = app.create_lot(1).await;
        let book = format!("/api/v1/lots/{}/book", lot_id);

        let (status, _) = app.send("POST", &book, Some(&alice), None).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = app.send("POST", &book, Some(&bob), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body["error"],
            format!("No available spot in parking lot {}", lot_id)
        );

        let (status, _) = app.send("POST", &book, Some(&alice), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .send("POST", "/api/v1/lots/999/book", Some(&bob), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn shrinking_into_occupied_spots_is_refused() {
        let app = app().await;
        let lot_id = app.create_lot(2).await;
        for name in ["alice", "bob"] {
            let token = app.driver(name).await;
            let (status, _) = app
                .send("POST", &format!("/api/v1/lots/{}/book", lot_id), Some(&token), None)
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let capacity = format!("/api/v1/lots/{}/capacity", lot_id);
        let (status, _) = app
            .send(
                "PUT",
                &capacity,
                Some(&app.admin_token),
                Some(json!({ "maximum_spots": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .send(
                "PUT",
                &capacity,
                Some(&app.admin_token),
                Some(json!({ "maximum_spots": 0 })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = app
            .send(
                "PUT",
                &capacity,
                Some(&app.admin_token),
                Some(json!({ "maximum_spots": 4 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["maximum_spots"], 4);

        let (status, _) = app
            .send("DELETE", &format!("/api/v1/lots/{}", lot_id), Some(&app.admin_token), None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn admin_summary_counts_users_and_active_reservations() {
        let app = app().await;
        let alice = app.driver("alice").await;
        app.driver("bob").await;
        let lot_id = app.create_lot(2).await;
        app.send("POST", &format!("/api/v1/lots/{}/book", lot_id), Some(&alice), None)
            .await;

        let (status, body) = app
            .send("GET", "/api/v1/admin/summary", Some(&app.admin_token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["regular_users"], 2);
        assert_eq!(body["data"]["active_reservations"], 1);
        assert_eq!(body["data"]["lots"][0]["occupied_spots"], 1);

        let (_, body) = app
            .send("GET", "/api/v1/users", Some(&app.admin_token), None)
            .await;
        let users = body["data"].as_array().unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.iter().all(|u| u["user"].get("password_hash").is_none()));
    }

    #[tokio::test]
    async fn history_limit_is_clamped() {
        let app = app().await;
        let driver = app.driver("alice").await;
        let lot_id = app.create_lot(1).await;

        for _ in 0..3 {
            let (_, body) = app
                .send("POST", &format!("/api/v1/lots/{}/book", lot_id), Some(&driver), None)
                .await;
            let id = body["data"]["id"].as_i64().unwrap();
            app.clock.advance(Duration::minutes(30));
            app.send(
                "POST",
                &format!("/api/v1/reservations/{}/release", id),
                Some(&driver),
                None,
            )
            .await;
        }

        let (_, body) = app
            .send("GET", "/api/v1/reservations/history?limit=2", Some(&driver), None)
            .await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (_, body) = app
            .send("GET", "/api/v1/reservations/history?limit=0", Some(&driver), None)
            .await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let app = app().await;
        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();
        let mut svc = app.router.clone().into_service();
        let response = svc.call(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }
}
