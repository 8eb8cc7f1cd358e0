//! Business rules shared by the services and the monolithic variant.

use crate::error::DomainError;
use crate::status::{PaymentStatus, ShipmentStatus};

/// Largest amount a payment may carry and still be processed.
pub const PAYMENT_AMOUNT_LIMIT: i64 = 1000;

/// Largest quantity a shipment may carry and still be processed.
pub const SHIPPING_QUANTITY_LIMIT: i64 = 100;

/// Validates a payment amount at creation time.
pub fn validate_amount(amount: i64) -> Result<(), DomainError> {
    if amount < 0 {
        return Err(DomainError::InvalidAmount(amount));
    }
    Ok(())
}

/// Validates a shipping quantity at creation time.
pub fn validate_quantity(quantity: i64) -> Result<(), DomainError> {
    if quantity < 0 {
        return Err(DomainError::InvalidQuantity(quantity));
    }
    Ok(())
}

/// The processing rule for payments: within the limit is `Processed`,
/// over the limit is `Exceeded`. Deterministic, so re-processing the
/// same payment always lands on the same status.
pub fn payment_status_for(amount: i64) -> PaymentStatus {
    if amount <= PAYMENT_AMOUNT_LIMIT {
        PaymentStatus::Processed
    } else {
        PaymentStatus::Exceeded
    }
}

/// The processing rule for shipments, symmetric to payments.
pub fn shipment_status_for(quantity: i64) -> ShipmentStatus {
    if quantity <= SHIPPING_QUANTITY_LIMIT {
        ShipmentStatus::Processed
    } else {
        ShipmentStatus::Exceeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(0).is_ok());
        assert!(validate_amount(5000).is_ok());
        assert!(matches!(
            validate_amount(-1),
            Err(DomainError::InvalidAmount(-1))
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(0).is_ok());
        assert!(matches!(
            validate_quantity(-7),
            Err(DomainError::InvalidQuantity(-7))
        ));
    }

    #[test]
    fn test_payment_threshold_boundary() {
        assert_eq!(payment_status_for(1000), PaymentStatus::Processed);
        assert_eq!(payment_status_for(1001), PaymentStatus::Exceeded);
        assert_eq!(payment_status_for(0), PaymentStatus::Processed);
    }

    #[test]
    fn test_shipment_threshold_boundary() {
        assert_eq!(shipment_status_for(100), ShipmentStatus::Processed);
        assert_eq!(shipment_status_for(101), ShipmentStatus::Exceeded);
    }
}
