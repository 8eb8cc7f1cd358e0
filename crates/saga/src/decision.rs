//! The join-then-decide table shared by every coordination variant.

use domain::{PaymentStatus, ShipmentStatus};
use serde::{Deserialize, Serialize};

/// The outcome of one sibling's processing step.
///
/// `Exceeded` is a valid business outcome requiring compensation
/// upstream, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepOutcome {
    Processed,
    Exceeded,
}

impl StepOutcome {
    /// Returns true for the successful outcome.
    pub fn is_processed(&self) -> bool {
        matches!(self, StepOutcome::Processed)
    }
}

impl From<PaymentStatus> for StepOutcome {
    /// Classifies a payment processing result.
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Exceeded => StepOutcome::Exceeded,
            _ => StepOutcome::Processed,
        }
    }
}

impl From<ShipmentStatus> for StepOutcome {
    /// Classifies a shipment processing result.
    fn from(status: ShipmentStatus) -> Self {
        match status {
            ShipmentStatus::Exceeded => StepOutcome::Exceeded,
            _ => StepOutcome::Processed,
        }
    }
}

/// The reconciliation path chosen once both sibling outcomes are in.
///
/// Compensation targets the sibling that reached `Processed`; a sibling
/// that exceeded its limit keeps `Exceeded` as its own terminal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Both processed: finalize the order, no compensation.
    Complete,

    /// Both exceeded: hold the order only.
    HoldOrderOnly,

    /// Payment exceeded, shipping processed: hold order and shipment.
    HoldOrderAndShipment,

    /// Shipping exceeded, payment processed: hold order and payment.
    HoldOrderAndPayment,
}

impl Decision {
    /// Evaluates the joined pair of sibling outcomes.
    pub fn from_outcomes(payment: StepOutcome, shipping: StepOutcome) -> Self {
        match (payment, shipping) {
            (StepOutcome::Processed, StepOutcome::Processed) => Decision::Complete,
            (StepOutcome::Exceeded, StepOutcome::Exceeded) => Decision::HoldOrderOnly,
            (StepOutcome::Exceeded, StepOutcome::Processed) => Decision::HoldOrderAndShipment,
            (StepOutcome::Processed, StepOutcome::Exceeded) => Decision::HoldOrderAndPayment,
        }
    }

    /// Returns true when the decision requires compensating calls.
    pub fn requires_reconciliation(&self) -> bool {
        !matches!(self, Decision::Complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_quadrants() {
        assert_eq!(
            Decision::from_outcomes(StepOutcome::Processed, StepOutcome::Processed),
            Decision::Complete
        );
        assert_eq!(
            Decision::from_outcomes(StepOutcome::Exceeded, StepOutcome::Exceeded),
            Decision::HoldOrderOnly
        );
        assert_eq!(
            Decision::from_outcomes(StepOutcome::Exceeded, StepOutcome::Processed),
            Decision::HoldOrderAndShipment
        );
        assert_eq!(
            Decision::from_outcomes(StepOutcome::Processed, StepOutcome::Exceeded),
            Decision::HoldOrderAndPayment
        );
    }

    #[test]
    fn test_only_complete_skips_reconciliation() {
        assert!(!Decision::Complete.requires_reconciliation());
        assert!(Decision::HoldOrderOnly.requires_reconciliation());
        assert!(Decision::HoldOrderAndShipment.requires_reconciliation());
        assert!(Decision::HoldOrderAndPayment.requires_reconciliation());
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(
            StepOutcome::from(PaymentStatus::Processed),
            StepOutcome::Processed
        );
        assert_eq!(
            StepOutcome::from(PaymentStatus::Exceeded),
            StepOutcome::Exceeded
        );
        assert_eq!(
            StepOutcome::from(ShipmentStatus::Exceeded),
            StepOutcome::Exceeded
        );
        assert!(StepOutcome::from(ShipmentStatus::Processed).is_processed());
    }
}
