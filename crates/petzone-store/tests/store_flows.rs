use petzone_model::{Money, PaymentMethod, Quantity, SessionId, SlotTime};
use petzone_store::{
    AppointmentFilter, AppointmentInput, CheckoutInput, ProductFilter, ProductInput,
    ReservationInput, Store, StoreError, SLOT_CAPACITY,
};

fn storefront() -> Store {
    let store = Store::open_in_memory().expect("open");
    let food = store.create_category("Food", "food").expect("category");
    let toys = store.create_category("Toys", "toys").expect("category");
    for (name, category, cents, stock) in [
        ("Premium Dog Food", food, 4590, 8),
        ("Cat Treats", food, 750, 20),
        ("Rope Toy", toys, 990, 3),
    ] {
        store
            .create_product(&ProductInput {
                name: name.to_string(),
                description: None,
                category_id: category,
                price: Money::from_cents(cents).expect("money"),
                stock,
                image: None,
                sku: None,
                featured: false,
            })
            .expect("product");
    }
    store
        .create_service(
            "Grooming",
            "grooming",
            Money::from_cents(3500).expect("money"),
            45,
            &["bath".to_string()],
        )
        .expect("service");
    store
}

fn checkout_details() -> CheckoutInput {
    CheckoutInput {
        customer_name: "Ana Torres".to_string(),
        customer_email: "ana@petzone.example".to_string(),
        customer_phone: "987654321".to_string(),
        shipping_address: "Av. Central 42".to_string(),
        payment_method: PaymentMethod::Card,
        notes: Some("ring the bell".to_string()),
    }
}

#[test]
fn browse_cart_checkout_flow() {
    let store = storefront();
    let products = store
        .list_products(&ProductFilter::default())
        .expect("list");
    assert_eq!(products.len(), 3);

    let session = SessionId::parse("flow-session-1").expect("session");
    store
        .add_to_cart(&session, products[0].id, Quantity::new(2).expect("qty"))
        .expect("add");
    store
        .add_to_cart(&session, products[2].id, Quantity::ONE)
        .expect("add");

    let (items, totals) = store.fetch_cart(&session).expect("cart");
    assert_eq!(items.len(), 2);
    let expected = 2 * products[0].price.cents() + products[2].price.cents();
    assert_eq!(totals.total.cents(), expected);

    let order = store.checkout(&session, &checkout_details()).expect("checkout");
    assert_eq!(order.total.cents(), expected);
    assert_eq!(order.notes.as_deref(), Some("ring the bell"));

    // Stock moved, cart emptied, order retrievable by code.
    let refreshed = store.get_product(products[0].id).expect("product");
    assert_eq!(refreshed.stock, products[0].stock - 2);
    assert_eq!(store.cart_count(&session).expect("count"), 0);
    let fetched = store.get_order(&order.code).expect("order");
    assert_eq!(fetched.lines.len(), 2);
}

#[test]
fn two_sessions_cannot_oversell_the_last_units() {
    let store = storefront();
    let products = store
        .list_products(&ProductFilter::default())
        .expect("list");
    let scarce = products
        .iter()
        .find(|p| p.name == "Rope Toy")
        .expect("scarce product");

    let first = SessionId::parse("flow-session-a").expect("session");
    let second = SessionId::parse("flow-session-b").expect("session");
    store
        .add_to_cart(&first, scarce.id, Quantity::new(3).expect("qty"))
        .expect("add");
    store
        .add_to_cart(&second, scarce.id, Quantity::new(3).expect("qty"))
        .expect("add");

    store.checkout(&first, &checkout_details()).expect("first wins");
    let err = store
        .checkout(&second, &checkout_details())
        .expect_err("stock gone");
    assert!(matches!(err, StoreError::InsufficientStock { available: 0, .. }));

    // The losing cart is untouched for the customer to adjust.
    assert_eq!(store.cart_count(&second).expect("count"), 3);
}

#[test]
fn reservation_and_appointment_flow() {
    let store = storefront();
    let service = store.get_service_by_slug("grooming").expect("service");
    let slot = SlotTime::parse("2026-09-15", "11:00").expect("slot");

    for i in 0..SLOT_CAPACITY {
        store
            .create_reservation(&ReservationInput {
                service_id: service.id,
                customer_name: format!("Client {i}"),
                customer_email: format!("c{i}@petzone.example"),
                customer_phone: "987654321".to_string(),
                pet_name: "Rocky".to_string(),
                pet_type: "dog".to_string(),
                slot,
                notes: None,
            })
            .expect("book");
    }
    let availability = store
        .slot_availability(service.id, &slot)
        .expect("availability");
    assert!(!availability.available);

    let appointment = store
        .create_appointment(&AppointmentInput {
            name: "Diego".to_string(),
            email: "diego@petzone.example".to_string(),
            phone: "912345678".to_string(),
            service: "Grooming".to_string(),
            message: Some("slot is full, please call me".to_string()),
            ip_address: None,
        })
        .expect("appointment");
    let page = store
        .list_appointments(&AppointmentFilter {
            status: None,
            search: Some(appointment.code.as_str().to_string()),
            page: 1,
            limit: 10,
        })
        .expect("search by code");
    assert_eq!(page.total, 1);
    assert_eq!(page.appointments[0].id, appointment.id);
}
