//! Input normalization shared by the services.

use chrono::{DateTime, Duration, Utc};
use common::{Money, Quantity};

use crate::error::{DomainError, Result};

/// How far in the past, in minutes, a delivery date may lie before it is rejected.
pub const DELIVERY_DATE_SKEW_MINUTES: i64 = 5;

pub fn sanitize(value: &str) -> String {
    value.trim().to_string()
}

/// Trims an optional field, mapping blank values to `None`.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Parses an optional closed-enumeration field.
///
/// Blank input counts as absent. Unknown values fail with `message`.
pub fn parse_optional<T: std::str::FromStr>(
    value: Option<&str>,
    message: &str,
) -> Result<Option<T>> {
    match non_blank(value) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| DomainError::validation(message)),
        None => Ok(None),
    }
}

/// Parses an RFC 3339 delivery date that is not meaningfully in the past.
pub fn parse_delivery_date(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|_| DomainError::validation("invalid delivery date format"))?
        .with_timezone(&Utc);
    if parsed < now - Duration::minutes(DELIVERY_DATE_SKEW_MINUTES) {
        return Err(DomainError::validation("delivery date cannot be in the past"));
    }
    Ok(parsed)
}

/// Checks that a positive quantity fits its storage column.
pub fn check_quantity(quantity: Quantity) -> Result<()> {
    if !quantity.is_positive() {
        return Err(DomainError::validation("quantity must be greater than 0"));
    }
    check_stock_quantity(quantity)
}

/// Like [`check_quantity`] but also accepts zero, as product stock may be.
pub fn check_stock_quantity(quantity: Quantity) -> Result<()> {
    if quantity.is_negative() {
        return Err(DomainError::validation("quantity cannot be negative"));
    }
    if !quantity.has_valid_scale() {
        return Err(DomainError::validation(format!(
            "quantity cannot have more than {} decimal places",
            Quantity::SCALE
        )));
    }
    if quantity.exceeds_max() {
        return Err(DomainError::validation(format!(
            "quantity cannot exceed {}",
            Quantity::MAX_UNITS
        )));
    }
    Ok(())
}

pub fn check_unit_price(price: Money) -> Result<()> {
    if !price.is_positive() {
        return Err(DomainError::validation("price per unit must be greater than 0"));
    }
    if !price.has_valid_scale() {
        return Err(DomainError::validation(format!(
            "price per unit cannot have more than {} decimal places",
            Money::SCALE
        )));
    }
    if price.exceeds_max_unit_price() {
        return Err(DomainError::validation(format!(
            "price per unit cannot exceed {}",
            Money::MAX_UNIT_PRICE
        )));
    }
    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Ten-digit Indian mobile number starting with 6 to 9.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10
        && phone.chars().all(|c| c.is_ascii_digit())
        && matches!(phone.as_bytes()[0], b'6'..=b'9')
}

#[cfg(test)]
mod tests {
    use common::DeliverySlot;

    use super::*;

    #[test]
    fn blank_optional_fields_are_absent() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" note ")), Some("note".to_string()));
    }

    #[test]
    fn parse_optional_reports_given_message() {
        let slot: Option<DeliverySlot> =
            parse_optional(Some("09:00-12:00"), "invalid delivery slot").unwrap();
        assert_eq!(slot, Some(DeliverySlot::Morning));

        let err = parse_optional::<DeliverySlot>(Some("21:00-23:00"), "invalid delivery slot")
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid delivery slot");

        let none: Option<DeliverySlot> = parse_optional(Some(""), "invalid delivery slot").unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn delivery_date_tolerates_small_skew() {
        let now = Utc::now();
        let slightly_past = (now - Duration::minutes(3)).to_rfc3339();
        assert!(parse_delivery_date(&slightly_past, now).is_ok());

        let past = (now - Duration::minutes(10)).to_rfc3339();
        assert_eq!(
            parse_delivery_date(&past, now).unwrap_err().to_string(),
            "delivery date cannot be in the past"
        );

        assert_eq!(
            parse_delivery_date("tomorrow", now).unwrap_err().to_string(),
            "invalid delivery date format"
        );
    }

    #[test]
    fn email_and_phone_rules() {
        assert!(is_valid_email("asha@farm.in"));
        assert!(!is_valid_email("asha.farm.in"));
        assert!(!is_valid_email("asha@farm"));
        assert!(!is_valid_email("a sha@farm.in"));

        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("5876543210"));
        assert!(!is_valid_phone("98765"));
        assert!(!is_valid_phone("98765432ab"));
    }

    #[test]
    fn quantity_bounds() {
        use rust_decimal::Decimal;

        assert!(check_quantity(Quantity::new(Decimal::new(2500, 3))).is_ok());
        assert_eq!(
            check_quantity(Quantity::ZERO).unwrap_err().to_string(),
            "quantity must be greater than 0"
        );
        assert!(check_stock_quantity(Quantity::ZERO).is_ok());
        assert_eq!(
            check_quantity(Quantity::new(Decimal::new(4, 4)))
                .unwrap_err()
                .to_string(),
            "quantity cannot have more than 3 decimal places"
        );
        assert_eq!(
            check_quantity(Quantity::from(Quantity::MAX_UNITS + 1))
                .unwrap_err()
                .to_string(),
            "quantity cannot exceed 1000000"
        );
    }

    #[test]
    fn unit_price_bounds() {
        use rust_decimal::Decimal;

        assert!(check_unit_price(Money::new(Decimal::new(4050, 2))).is_ok());
        assert!(check_unit_price(Money::ZERO).is_err());
        assert_eq!(
            check_unit_price(Money::new(Decimal::new(40505, 3)))
                .unwrap_err()
                .to_string(),
            "price per unit cannot have more than 2 decimal places"
        );
        assert_eq!(
            check_unit_price(Money::from(Money::MAX_UNIT_PRICE + 1))
                .unwrap_err()
                .to_string(),
            "price per unit cannot exceed 10000000"
        );
    }
}
