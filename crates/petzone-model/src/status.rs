use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            pub fn parse(input: &str) -> Result<Self, ValidationError> {
                match input.trim() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ValidationError(format!(
                        concat!("unknown ", stringify!($name), ": {}"),
                        other
                    ))),
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

status_enum! {
    /// Lifecycle of an order created at checkout.
    OrderStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        Shipped => "shipped",
        Delivered => "delivered",
        Cancelled => "cancelled",
    }
}

status_enum! {
    ReservationStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

status_enum! {
    AppointmentStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

status_enum! {
    PaymentMethod {
        Cash => "cash",
        Card => "card",
        Transfer => "transfer",
    }
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        assert_eq!(OrderStatus::parse("pending").expect("parse"), OrderStatus::Pending);
        assert_eq!(OrderStatus::Shipped.as_str(), "shipped");
        assert_eq!(
            ReservationStatus::parse("cancelled").expect("parse"),
            ReservationStatus::Cancelled
        );
        assert!(OrderStatus::parse("unknown").is_err());
    }

    #[test]
    fn payment_methods_parse() {
        assert_eq!(PaymentMethod::parse("card").expect("parse"), PaymentMethod::Card);
        assert!(PaymentMethod::parse("crypto").is_err());
    }

    #[test]
    fn serde_uses_snake_case_text() {
        let json = serde_json::to_string(&AppointmentStatus::Confirmed).expect("serialize");
        assert_eq!(json, "\"confirmed\"");
    }
}
