use crate::ValidationError;
use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

fn parse_code(
    input: &str,
    prefix: &str,
    suffix_len: usize,
    suffix_ok: fn(char) -> bool,
) -> Result<String, ValidationError> {
    let s = input.trim();
    let rest = s
        .strip_prefix(prefix)
        .ok_or_else(|| ValidationError(format!("code must start with {prefix}")))?;
    let (date, suffix) = rest
        .split_once('-')
        .ok_or_else(|| ValidationError("code must be PREFIX-YYYYMMDD-SUFFIX".to_string()))?;
    if date.len() != 8 || !date.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError(
            "code date segment must be eight digits".to_string(),
        ));
    }
    if suffix.len() != suffix_len || !suffix.chars().all(suffix_ok) {
        return Err(ValidationError(format!(
            "code suffix must be {suffix_len} characters"
        )));
    }
    Ok(s.to_string())
}

/// Order code: `PZ-YYYYMMDD-NNNN` with a random four-digit suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct OrderCode(String);

impl OrderCode {
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> Self {
        Self(format!(
            "PZ-{}-{:04}",
            date.format("%Y%m%d"),
            rng.gen_range(0..10_000)
        ))
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        parse_code(input, "PZ-", 4, |c| c.is_ascii_digit()).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OrderCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reservation code: `RES-YYYYMMDD-NNNN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct ReservationCode(String);

impl ReservationCode {
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> Self {
        Self(format!(
            "RES-{}-{:04}",
            date.format("%Y%m%d"),
            rng.gen_range(0..10_000)
        ))
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        parse_code(input, "RES-", 4, |c| c.is_ascii_digit()).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ReservationCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Appointment code: `CITA-YYYYMMDD-XXXXXX` with an uppercase hex suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct AppointmentCode(String);

impl AppointmentCode {
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> Self {
        let suffix: u32 = rng.gen_range(0..0x100_0000);
        Self(format!("CITA-{}-{suffix:06X}", date.format("%Y%m%d")))
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        parse_code(input, "CITA-", 6, |c| {
            c.is_ascii_digit() || c.is_ascii_uppercase()
        })
        .map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AppointmentCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const SESSION_ID_MIN_LEN: usize = 8;
pub const SESSION_ID_MAX_LEN: usize = 64;

/// Opaque cart session token carried in the `x-cart-session` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.len() < SESSION_ID_MIN_LEN || s.len() > SESSION_ID_MAX_LEN {
            return Err(ValidationError(format!(
                "session id must be {SESSION_ID_MIN_LEN}..={SESSION_ID_MAX_LEN} characters"
            )));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError(
                "session id must match [A-Za-z0-9_-]+".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 27).expect("valid date")
    }

    #[test]
    fn generated_codes_round_trip() {
        let mut rng = StepRng::new(42, 7);
        let order = OrderCode::generate(date(), &mut rng);
        assert!(order.as_str().starts_with("PZ-20260827-"));
        assert_eq!(OrderCode::parse(order.as_str()).expect("parse"), order);

        let res = ReservationCode::generate(date(), &mut rng);
        assert!(res.as_str().starts_with("RES-20260827-"));
        assert_eq!(ReservationCode::parse(res.as_str()).expect("parse"), res);

        let cita = AppointmentCode::generate(date(), &mut rng);
        assert!(cita.as_str().starts_with("CITA-20260827-"));
        assert_eq!(AppointmentCode::parse(cita.as_str()).expect("parse"), cita);
    }

    #[test]
    fn code_parse_rejects_wrong_shape() {
        assert!(OrderCode::parse("PZ-2026-0001").is_err());
        assert!(OrderCode::parse("RES-20260827-0001").is_err());
        assert!(AppointmentCode::parse("CITA-20260827-xyz").is_err());
        assert!(ReservationCode::parse("RES-20260827-12345").is_err());
    }

    #[test]
    fn session_id_bounds_and_charset() {
        assert!(SessionId::parse("6f9619ff-8b86-d011-b42d-00c04fc964ff").is_ok());
        assert!(SessionId::parse("short").is_err());
        assert!(SessionId::parse("bad token!").is_err());
    }
}
