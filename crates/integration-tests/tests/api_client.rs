//! The HTTP client and the app session against a mock backend.

#![allow(clippy::unwrap_used)]

use std::num::NonZeroU32;
use std::sync::Arc;

use foody_client::api::ApiError;
use foody_client::api::restaurants::RestaurantQuery;
use foody_client::checkout::DeliveryDetails;
use foody_client::{
    ApiClient, ClientConfig, Credentials, Distance, FoodyApp, MemoryStorage, MountOutcome,
    SharedStorage, Toasts,
};
use foody_core::{CartLineId, MenuId, OrderStatus, Rupiah};
use foody_integration_tests::menu;
use secrecy::SecretString;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::for_base_url(Url::parse(&server.uri()).unwrap())
}

fn client(server: &MockServer, token: Option<&str>) -> ApiClient {
    let credentials = match token {
        Some(token) => Credentials::with_token(token),
        None => Credentials::default(),
    };
    ApiClient::new(&config(server), credentials).unwrap()
}

fn server_cart() -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "cart": [{
                "restaurant": { "id": 3, "name": "Warung Padang Sederhana", "logo": null },
                "items": [{
                    "id": 41,
                    "menu": { "id": 301, "foodName": "Rendang", "price": 28000, "type": "food", "image": "rendang.jpg" },
                    "quantity": 2,
                    "itemTotal": 56000
                }],
                "subtotal": 56000
            }],
            "summary": { "totalItems": 2, "totalPrice": 56000, "restaurantCount": 1 }
        }
    })
}

#[tokio::test]
async fn test_bearer_token_sent_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_cart()))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = client(&server, Some("tok-123")).cart().await.unwrap();
    assert_eq!(snapshot.menu_ids(), vec![MenuId::new(301)]);
    assert_eq!(snapshot.summary.unwrap().total_price, Rupiah::from(56_000));
}

#[tokio::test]
async fn test_missing_token_requires_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "success": false, "message": "Access token required" })),
        )
        .mount(&server)
        .await;

    let err = client(&server, None).cart().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert!(err.requires_login());
    assert!(!err.is_server_error());
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/resto/recommended"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let err = client(&server, None).recommended_restaurants().await.unwrap_err();
    assert!(matches!(err, ApiError::RateLimited(7)));
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/order/checkout"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "message": "Menu is no longer available" })),
        )
        .mount(&server)
        .await;

    let app_config = config(&server);
    let mut app = FoodyApp::with_storage(
        &app_config,
        Arc::new(MemoryStorage::new()),
        Arc::new(MemoryStorage::new()),
        Toasts::new(),
    )
    .unwrap();
    // Local-only line: the mock has no cart routes, so seed it while logged out.
    app.cart_mut().add(menu(1, 10), NonZeroU32::MIN).await.unwrap();
    app.api().credentials().set("tok-123");

    let err = app.checkout(DeliveryDetails::new("Jl. Braga 1", "0812000000")).await.unwrap_err();
    assert_eq!(
        err.api().unwrap().user_message("Checkout failed. Please try again."),
        "Menu is no longer available"
    );
    assert_eq!(app.cart().lines().len(), 1);
}

#[tokio::test]
async fn test_restaurant_filters_become_query_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/resto"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "20"))
        .and(query_param("range", "5"))
        .and(query_param("priceMin", "25000"))
        .and(query_param("rating", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "restaurants": [{ "id": 7, "name": "Sate Khas Senayan", "star": 4.7 }],
                "pagination": { "page": 2, "limit": 20, "total": 21, "totalPages": 2 }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut query = RestaurantQuery {
        page: 2,
        ..RestaurantQuery::default()
    };
    query.filters.distance = Some(Distance::Km(5));
    query.filters.price_min = Some(Rupiah::from(25_000));
    query.filters.rating = Some(4);

    let page = client(&server, None).restaurants(&query).await.unwrap();
    assert_eq!(page.restaurants.len(), 1);
    assert_eq!(page.restaurants[0].name, "Sate Khas Senayan");
}

#[tokio::test]
async fn test_blank_search_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/resto/search"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let page = client(&server, None).search_restaurants("   ", 1, 20).await.unwrap();
    assert!(page.restaurants.is_empty());
}

#[tokio::test]
async fn test_my_orders_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/order/my-order"))
        .and(query_param("status", "on_the_way"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "orders": [], "pagination": { "page": 1, "totalPages": 1 } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server, Some("tok-123"))
        .my_orders(OrderStatus::OnTheWay, 1, 10)
        .await
        .unwrap();
    assert!(page.orders.is_empty());
}

#[tokio::test]
async fn test_session_login_mount_add_checkout_logout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "budi@foody.id", "password": "rahasia" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Login successful",
            "data": {
                "token": "tok-budi",
                "user": { "id": 1, "name": "Budi", "email": "budi@foody.id", "phone": "6281234567890" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .and(header("authorization", "Bearer tok-budi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_cart()))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/cart/41"))
        .and(body_json(json!({ "quantity": 3 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "cartItem": { "id": 41, "quantity": 3 } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/order/checkout"))
        .and(header("authorization", "Bearer tok-budi"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "message": "Order created" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let durable: SharedStorage = Arc::new(MemoryStorage::new());
    let app_config = config(&server);
    let mut app = FoodyApp::with_storage(
        &app_config,
        Arc::clone(&durable),
        Arc::new(MemoryStorage::new()),
        Toasts::new(),
    )
    .unwrap();
    assert!(!app.auth().is_logged_in());

    let user = app
        .login(" Budi@Foody.id ", SecretString::from("rahasia"), true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.name, "Budi");

    let outcome = app.cart_mut().on_mount(&CancellationToken::new()).await.unwrap();
    assert_eq!(outcome, MountOutcome::Adopted);
    assert_eq!(app.cart().lines()[0].remote_line_id, Some(CartLineId::new(41)));

    app.cart_mut().increase(MenuId::new(301)).await.unwrap();
    assert_eq!(app.cart().lines()[0].quantity.get(), 3);

    // A remembered login survives a restart.
    let restarted = FoodyApp::with_storage(
        &app_config,
        Arc::clone(&durable),
        Arc::new(MemoryStorage::new()),
        Toasts::new(),
    )
    .unwrap();
    assert!(restarted.auth().is_logged_in());
    assert_eq!(restarted.cart().lines().len(), 1);

    let receipt = app
        .checkout(DeliveryDetails::new("Jl. Braga 1, Bandung", "081234567890"))
        .await
        .unwrap();
    assert_eq!(receipt.total_items, 3);
    assert_eq!(receipt.price, Rupiah::from(84_000));
    assert!(app.cart().state().is_empty());
    assert_eq!(app.last_receipt(), receipt);

    app.logout().await;
    assert!(!app.auth().is_logged_in());
    assert!(app.filters().is_empty());
}
