use petzone_model::Money;
use petzone_server::{build_router, AppState, ServerConfig};
use petzone_store::{ProductInput, Store};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn seeded_store() -> Store {
    let store = Store::open_in_memory().expect("open store");
    let category = store.create_category("Food", "food").expect("category");
    store
        .create_product(&ProductInput {
            name: "Premium Dog Food".to_string(),
            description: Some("Dry food, 10kg bag".to_string()),
            category_id: category,
            price: Money::from_cents(2500).expect("price"),
            stock: 5,
            image: None,
            sku: Some("DOG-FOOD-10".to_string()),
            featured: true,
        })
        .expect("product");
    store
        .create_service(
            "Grooming",
            "grooming",
            Money::from_cents(8000).expect("price"),
            60,
            &[],
        )
        .expect("service");
    store
}

async fn spawn_app(store: Store) -> std::net::SocketAddr {
    spawn_app_with(store, ServerConfig::default()).await
}

async fn spawn_app_with(store: Store, config: ServerConfig) -> std::net::SocketAddr {
    let state = AppState::new(store, config);
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn send_raw(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> (u16, String, Value) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    if let Some(body) = body {
        req.push_str(&format!(
            "Content-Type: application/json\r\nContent-Length: {}\r\n",
            body.len()
        ));
    }
    req.push_str("\r\n");
    if let Some(body) = body {
        req.push_str(body);
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    let json = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).expect("json body")
    };
    (status, head.to_lowercase(), json)
}

fn header_value(head: &str, name: &str) -> Option<String> {
    head.lines()
        .find_map(|line| line.strip_prefix(&format!("{name}: ")))
        .map(str::to_string)
}

#[tokio::test]
async fn health_and_catalog_read_surface() {
    let addr = spawn_app(seeded_store()).await;

    let (status, head, body) = send_raw(addr, "GET", "/healthz", &[], None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert!(head.contains("x-request-id: "));

    let (status, _, _) = send_raw(addr, "GET", "/readyz", &[], None).await;
    assert_eq!(status, 200);

    let (status, _, body) = send_raw(addr, "GET", "/v1/products", &[], None).await;
    assert_eq!(status, 200);
    let products = body["products"].as_array().expect("products array");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Premium Dog Food");
    assert_eq!(products[0]["price"], 2500);

    let (status, _, body) = send_raw(addr, "GET", "/v1/products?q=nomatch", &[], None).await;
    assert_eq!(status, 200);
    assert!(body["products"].as_array().expect("array").is_empty());

    let (status, _, body) = send_raw(addr, "GET", "/v1/products/999", &[], None).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NotFound");

    let (status, _, body) = send_raw(addr, "GET", "/v1/services/grooming", &[], None).await;
    assert_eq!(status, 200);
    assert_eq!(body["service"]["slug"], "grooming");
}

#[tokio::test]
async fn cart_and_checkout_flow() {
    let addr = spawn_app(seeded_store()).await;

    // First cart write mints a session and echoes it back.
    let (status, head, body) = send_raw(
        addr,
        "POST",
        "/v1/cart/items",
        &[],
        Some(r#"{"product_id": 1, "quantity": 2}"#),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], 2);
    let session = header_value(&head, "x-cart-session").expect("minted session");
    assert!(session.starts_with("cart-"));

    let session_header = [("x-cart-session", session.as_str())];
    let (status, _, body) = send_raw(addr, "GET", "/v1/cart", &session_header, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["totals"]["total_items"], 2);
    assert_eq!(body["totals"]["total"], 5000);

    let checkout = r#"{
        "name": "Ana Torres",
        "email": "ana@petzone.example",
        "phone": "987654321",
        "address": "Av. Siempre Viva 123",
        "payment_method": "cash"
    }"#;
    let (status, _, body) = send_raw(addr, "POST", "/v1/checkout", &session_header, Some(checkout)).await;
    assert_eq!(status, 200);
    let code = body["order"]["code"].as_str().expect("order code");
    assert!(code.starts_with("PZ-"));
    assert_eq!(body["order"]["total"], 5000);
    assert_eq!(body["order"]["status"], "pending");

    // Stock decremented and cart emptied by the same transaction.
    let (_, _, body) = send_raw(addr, "GET", "/v1/products/1", &[], None).await;
    assert_eq!(body["product"]["stock"], 3);
    let (status, _, body) = send_raw(addr, "POST", "/v1/checkout", &session_header, Some(checkout)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "EmptyCart");

    // The order code is enough to look the order up.
    let (status, _, body) = send_raw(addr, "GET", &format!("/v1/orders/{code}"), &[], None).await;
    assert_eq!(status, 200);
    assert_eq!(body["order"]["lines"][0]["quantity"], 2);
}

#[tokio::test]
async fn checkout_rejects_oversold_cart() {
    let addr = spawn_app(seeded_store()).await;
    let checkout = r#"{
        "name": "Ana Torres",
        "email": "ana@petzone.example",
        "phone": "987654321",
        "address": "Av. Siempre Viva 123",
        "payment_method": "card"
    }"#;

    let mut sessions = Vec::new();
    for _ in 0..2 {
        let (status, head, _) = send_raw(
            addr,
            "POST",
            "/v1/cart/items",
            &[],
            Some(r#"{"product_id": 1, "quantity": 4}"#),
        )
        .await;
        assert_eq!(status, 200);
        sessions.push(header_value(&head, "x-cart-session").expect("session"));
    }

    let first = [("x-cart-session", sessions[0].as_str())];
    let (status, _, _) = send_raw(addr, "POST", "/v1/checkout", &first, Some(checkout)).await;
    assert_eq!(status, 200);

    // Only one unit left; the second cart still holds four.
    let second = [("x-cart-session", sessions[1].as_str())];
    let (status, _, body) = send_raw(addr, "POST", "/v1/checkout", &second, Some(checkout)).await;
    assert_eq!(status, 422);
    assert_eq!(body["error"]["code"], "InsufficientStock");
    assert_eq!(body["error"]["details"]["available"], 1);

    // The failed checkout must not have drained the losing cart.
    let (_, _, body) = send_raw(addr, "GET", "/v1/cart", &second, None).await;
    assert_eq!(body["totals"]["total_items"], 4);
}

#[tokio::test]
async fn reservation_slots_fill_up() {
    let addr = spawn_app(seeded_store()).await;
    let booking = |name: &str| {
        format!(
            r#"{{
                "service_id": 1,
                "name": "{name}",
                "email": "ana@petzone.example",
                "phone": "987654321",
                "pet_name": "Rocky",
                "pet_type": "dog",
                "date": "2026-09-07",
                "hour": "10:00"
            }}"#
        )
    };

    for i in 0..3 {
        let (status, _, body) = send_raw(
            addr,
            "POST",
            "/v1/reservations",
            &[],
            Some(&booking(&format!("Cliente {i}"))),
        )
        .await;
        assert_eq!(status, 200);
        assert!(body["reservation"]["code"]
            .as_str()
            .expect("code")
            .starts_with("RES-"));
    }

    let (status, _, body) = send_raw(
        addr,
        "GET",
        "/v1/reservations/availability?service_id=1&date=2026-09-07&hour=10",
        &[],
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["available"], false);
    assert_eq!(body["current"], 3);

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/v1/reservations",
        &[],
        Some(&booking("Cliente 3")),
    )
    .await;
    assert_eq!(status, 422);
    assert_eq!(body["error"]["code"], "SlotUnavailable");

    // The neighbouring hour is unaffected.
    let (status, _, body) = send_raw(
        addr,
        "GET",
        "/v1/reservations/availability?service_id=1&date=2026-09-07&hour=11",
        &[],
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["available"], true);
    assert_eq!(body["current"], 0);
}

#[tokio::test]
async fn stalled_requests_get_cut_off_at_the_deadline() {
    let config = ServerConfig {
        request_timeout: std::time::Duration::from_millis(200),
        ..ServerConfig::default()
    };
    let addr = spawn_app_with(seeded_store(), config).await;

    // Declare a body and never send it; the handler stays pending on the
    // body read until the deadline fires.
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let head = format!(
        "POST /v1/auth/login HTTP/1.1\r\nHost: {addr}\r\n\
         Content-Type: application/json\r\nContent-Length: 64\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(head.as_bytes()).await.expect("write head");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    assert!(
        response.starts_with("HTTP/1.1 408"),
        "expected 408, got: {response}"
    );
}

#[tokio::test]
async fn admin_surface_requires_login() {
    let store = seeded_store();
    store
        .create_admin_user("root", "correct-horse-battery", None, "admin")
        .expect("admin");
    let addr = spawn_app(store).await;

    let (status, _, body) = send_raw(addr, "GET", "/v1/stats/dashboard", &[], None).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"]["code"], "Unauthorized");

    let (status, _, _) = send_raw(
        addr,
        "POST",
        "/v1/auth/login",
        &[],
        Some(r#"{"username": "root", "password": "wrong"}"#),
    )
    .await;
    assert_eq!(status, 401);

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/v1/auth/login",
        &[],
        Some(r#"{"username": "root", "password": "correct-horse-battery"}"#),
    )
    .await;
    assert_eq!(status, 200);
    let token = body["token"].as_str().expect("token").to_string();
    let auth = format!("Bearer {token}");
    let auth_header = [("Authorization", auth.as_str())];

    let (status, _, body) = send_raw(addr, "GET", "/v1/stats/dashboard", &auth_header, None).await;
    assert_eq!(status, 200);
    assert_eq!(body["stats"]["active_products"], 1);

    let (status, _, _) = send_raw(addr, "POST", "/v1/auth/logout", &auth_header, None).await;
    assert_eq!(status, 200);
    let (status, _, _) = send_raw(addr, "GET", "/v1/stats/dashboard", &auth_header, None).await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn customer_accounts_register_and_login() {
    let addr = spawn_app(seeded_store()).await;

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/v1/account/register",
        &[],
        Some(r#"{"name": "Ana Torres", "email": "ana@petzone.example", "password": "hunter2hunter2"}"#),
    )
    .await;
    assert_eq!(status, 200);
    let token = body["token"].as_str().expect("token").to_string();

    let auth = format!("Bearer {token}");
    let (status, _, body) = send_raw(addr, "GET", "/v1/account/me", &[("Authorization", auth.as_str())], None).await;
    assert_eq!(status, 200);
    assert_eq!(body["user"]["email"], "ana@petzone.example");

    // Duplicate registration conflicts; the login path still works.
    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/v1/account/register",
        &[],
        Some(r#"{"name": "Ana Torres", "email": "ana@petzone.example", "password": "hunter2hunter2"}"#),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "Conflict");

    let (status, _, _) = send_raw(
        addr,
        "POST",
        "/v1/account/login",
        &[],
        Some(r#"{"email": "ANA@petzone.example", "password": "hunter2hunter2"}"#),
    )
    .await;
    assert_eq!(status, 200);
}
