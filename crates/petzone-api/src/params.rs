use crate::ApiError;
use petzone_model::{AppointmentStatus, OrderStatus, SlotTime};
use std::collections::BTreeMap;

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
}

impl Pagination {
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

pub fn parse_pagination(query: &BTreeMap<String, String>) -> Result<Pagination, ApiError> {
    let page = match query.get("page") {
        Some(raw) => {
            let value = raw
                .parse::<usize>()
                .map_err(|_| ApiError::invalid_param("page", raw))?;
            if value == 0 {
                return Err(ApiError::invalid_param("page", raw));
            }
            value
        }
        None => 1,
    };
    let limit = match query.get("limit") {
        Some(raw) => {
            let value = raw
                .parse::<usize>()
                .map_err(|_| ApiError::invalid_param("limit", raw))?;
            if value == 0 || value > MAX_PAGE_LIMIT {
                return Err(ApiError::invalid_param("limit", raw));
            }
            value
        }
        None => DEFAULT_PAGE_LIMIT,
    };
    Ok(Pagination { page, limit })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductListParams {
    pub category_id: Option<i64>,
    pub search: Option<String>,
}

pub fn parse_product_list(query: &BTreeMap<String, String>) -> Result<ProductListParams, ApiError> {
    let category_id = match query.get("category") {
        Some(raw) if !raw.trim().is_empty() => Some(
            raw.trim()
                .parse::<i64>()
                .map_err(|_| ApiError::invalid_param("category", raw))?,
        ),
        _ => None,
    };
    let search = query
        .get("q")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    Ok(ProductListParams {
        category_id,
        search,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentListParams {
    pub status: Option<AppointmentStatus>,
    pub search: Option<String>,
    pub pagination: Pagination,
}

pub fn parse_appointment_list(
    query: &BTreeMap<String, String>,
) -> Result<AppointmentListParams, ApiError> {
    let status = match query.get("status") {
        // "all" mirrors the storefront's explicit no-filter selection.
        Some(raw) if raw != "all" && !raw.trim().is_empty() => Some(
            AppointmentStatus::parse(raw).map_err(|_| ApiError::invalid_param("status", raw))?,
        ),
        _ => None,
    };
    let search = query
        .get("q")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    Ok(AppointmentListParams {
        status,
        search,
        pagination: parse_pagination(query)?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderListParams {
    pub status: Option<OrderStatus>,
    pub pagination: Pagination,
}

pub fn parse_order_list(query: &BTreeMap<String, String>) -> Result<OrderListParams, ApiError> {
    let status = match query.get("status") {
        Some(raw) if raw != "all" && !raw.trim().is_empty() => {
            Some(OrderStatus::parse(raw).map_err(|_| ApiError::invalid_param("status", raw))?)
        }
        _ => None,
    };
    Ok(OrderListParams {
        status,
        pagination: parse_pagination(query)?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityParams {
    pub service_id: i64,
    pub slot: SlotTime,
}

pub fn parse_availability(query: &BTreeMap<String, String>) -> Result<AvailabilityParams, ApiError> {
    let raw_service = query
        .get("service_id")
        .ok_or_else(|| ApiError::missing_param("service_id"))?;
    let service_id = raw_service
        .parse::<i64>()
        .map_err(|_| ApiError::invalid_param("service_id", raw_service))?;
    if service_id <= 0 {
        return Err(ApiError::invalid_param("service_id", raw_service));
    }
    let date = query
        .get("date")
        .ok_or_else(|| ApiError::missing_param("date"))?;
    let hour = query
        .get("hour")
        .ok_or_else(|| ApiError::missing_param("hour"))?;
    let slot = SlotTime::parse(date, hour)
        .map_err(|e| ApiError::validation_failed("slot", &e.to_string()))?;
    Ok(AvailabilityParams { service_id, slot })
}

/// Lookback window for the stats endpoints, bounded to keep queries cheap.
pub fn parse_window(
    query: &BTreeMap<String, String>,
    name: &str,
    default: u32,
    max: u32,
) -> Result<u32, ApiError> {
    match query.get(name) {
        Some(raw) => {
            let value = raw
                .parse::<u32>()
                .map_err(|_| ApiError::invalid_param(name, raw))?;
            if value == 0 || value > max {
                return Err(ApiError::invalid_param(name, raw));
            }
            Ok(value)
        }
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn pagination_defaults_and_bounds() {
        let p = parse_pagination(&q(&[])).expect("defaults");
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(p.offset(), 0);

        let p = parse_pagination(&q(&[("page", "3"), ("limit", "20")])).expect("parse");
        assert_eq!(p.offset(), 40);

        assert!(parse_pagination(&q(&[("page", "0")])).is_err());
        assert!(parse_pagination(&q(&[("limit", "101")])).is_err());
        assert!(parse_pagination(&q(&[("limit", "abc")])).is_err());
    }

    #[test]
    fn product_list_ignores_blank_filters() {
        let p = parse_product_list(&q(&[("category", ""), ("q", "  ")])).expect("parse");
        assert!(p.category_id.is_none());
        assert!(p.search.is_none());

        let p = parse_product_list(&q(&[("category", "4"), ("q", "shampoo")])).expect("parse");
        assert_eq!(p.category_id, Some(4));
        assert_eq!(p.search.as_deref(), Some("shampoo"));

        assert!(parse_product_list(&q(&[("category", "pets")])).is_err());
    }

    #[test]
    fn appointment_list_accepts_all_and_named_statuses() {
        let p = parse_appointment_list(&q(&[("status", "all")])).expect("parse");
        assert!(p.status.is_none());
        let p = parse_appointment_list(&q(&[("status", "pending")])).expect("parse");
        assert_eq!(p.status, Some(AppointmentStatus::Pending));
        assert!(parse_appointment_list(&q(&[("status", "nope")])).is_err());
    }

    #[test]
    fn availability_requires_all_dimensions() {
        let err = parse_availability(&q(&[("date", "2026-09-01"), ("hour", "10")]))
            .expect_err("missing service");
        assert_eq!(err.code, crate::ApiErrorCode::MissingParameter);

        let p = parse_availability(&q(&[
            ("service_id", "2"),
            ("date", "2026-09-01"),
            ("hour", "10:00"),
        ]))
        .expect("parse");
        assert_eq!(p.service_id, 2);
        assert_eq!(p.slot.hour, 10);

        assert!(parse_availability(&q(&[
            ("service_id", "-1"),
            ("date", "2026-09-01"),
            ("hour", "10"),
        ]))
        .is_err());
    }

    #[test]
    fn window_bounds() {
        assert_eq!(parse_window(&q(&[]), "days", 30, 365).expect("default"), 30);
        assert_eq!(
            parse_window(&q(&[("days", "7")]), "days", 30, 365).expect("parse"),
            7
        );
        assert!(parse_window(&q(&[("days", "0")]), "days", 30, 365).is_err());
        assert!(parse_window(&q(&[("days", "400")]), "days", 30, 365).is_err());
    }
}
