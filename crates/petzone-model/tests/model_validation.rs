use chrono::NaiveDate;
use petzone_model::{
    AppointmentCode, CustomerName, Email, Money, OrderCode, OrderStatus, Phone, Quantity,
    ReservationCode, SessionId, SlotTime,
};
use rand::rngs::mock::StepRng;

#[test]
fn newtypes_serialize_transparently() {
    let email = Email::parse("client@petzone.example").expect("email");
    assert_eq!(
        serde_json::to_string(&email).expect("serialize"),
        "\"client@petzone.example\""
    );
    let code = OrderCode::parse("PZ-20260827-0042").expect("code");
    assert_eq!(
        serde_json::to_string(&code).expect("serialize"),
        "\"PZ-20260827-0042\""
    );
    let money = Money::from_cents(1999).expect("money");
    assert_eq!(serde_json::to_string(&money).expect("serialize"), "1999");
}

#[test]
fn codes_generated_on_same_day_share_date_segment() {
    let date = NaiveDate::from_ymd_opt(2026, 1, 5).expect("date");
    let mut rng = StepRng::new(9, 13);
    let order = OrderCode::generate(date, &mut rng);
    let reservation = ReservationCode::generate(date, &mut rng);
    let appointment = AppointmentCode::generate(date, &mut rng);
    assert!(order.as_str().contains("-20260105-"));
    assert!(reservation.as_str().contains("-20260105-"));
    assert!(appointment.as_str().contains("-20260105-"));
}

#[test]
fn contact_fields_trim_input() {
    assert_eq!(
        CustomerName::parse("  Ana Torres  ").expect("name").as_str(),
        "Ana Torres"
    );
    assert_eq!(
        Phone::parse(" 987 654 321 ").expect("phone").as_str(),
        "987 654 321"
    );
}

#[test]
fn quantity_and_money_compose_into_totals() {
    let unit = Money::from_cents(2450).expect("money");
    let qty = Quantity::new(4).expect("qty");
    let line = unit.checked_mul(qty).expect("mul");
    let total = line.checked_add(Money::from_cents(550).expect("money")).expect("add");
    assert_eq!(total.to_string(), "103.50");
}

#[test]
fn statuses_reject_unknown_text() {
    assert!(OrderStatus::parse("returned").is_err());
}

#[test]
fn slot_and_session_validation() {
    assert!(SlotTime::parse("2026-02-30", "10").is_err());
    assert!(SessionId::parse("cart_68ae01f2b3c4d").is_ok());
}
