//! Turning a verified exchange into ledger movement legs.

use serde::{Deserialize, Serialize};

use gasflow_core::{
    CustomerId, CylinderStatus, CylinderTypeId, DomainError, DomainResult, Location, VehicleId,
};
use gasflow_inventory::{MovementRequest, MovementType, StockPoint};

use crate::allocation::{allocate_expected_shares, allocate_line_returns};
use crate::tracking::ExchangeTracking;

/// One order line as seen by the exchange step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeLine {
    pub cylinder_type_id: CylinderTypeId,
    pub ordered_quantity: i64,
    pub delivered_quantity: i64,
}

/// Customer-side balances for one cylinder type, read before any leg applies.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerStock {
    pub empty: i64,
    pub filled: i64,
}

impl CustomerStock {
    pub fn total(self) -> i64 {
        self.empty + self.filled
    }
}

/// Where collected empties go: back to the yard, or kept on the vehicle for
/// later stops.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnDestination {
    Yard,
    Vehicle,
}

impl ReturnDestination {
    fn location(self, vehicle_id: VehicleId) -> Location {
        match self {
            ReturnDestination::Yard => Location::yard(),
            ReturnDestination::Vehicle => Location::vehicle(vehicle_id),
        }
    }
}

/// Verify the customer can cover the empty return for every line.
///
/// `stock` is parallel to `lines`. Each line must cover both its share of
/// the order-level expectation (split proportionally by ordered quantity)
/// and the return quantity actually collected from it — an excess
/// collection can exceed the expectation, and it still has to come out of
/// the customer's balances. The available count is empties plus filled,
/// since filled units can be converted on the spot. Fails on the first
/// line that cannot cover the larger of the two, before anything is
/// persisted.
pub fn check_customer_stock(
    lines: &[ExchangeLine],
    stock: &[CustomerStock],
    empty_collected: i64,
    expected_empty: i64,
) -> DomainResult<()> {
    if lines.len() != stock.len() {
        return Err(DomainError::validation(
            "customer stock must be supplied for every order line",
        ));
    }
    let ordered: Vec<i64> = lines.iter().map(|l| l.ordered_quantity).collect();
    let expected = allocate_expected_shares(&ordered, expected_empty);
    let returns = allocate_line_returns(&ordered, empty_collected, expected_empty);
    for (((line, balances), expected), to_return) in
        lines.iter().zip(stock).zip(expected).zip(returns)
    {
        let needed = expected.max(to_return);
        if balances.total() < needed {
            return Err(DomainError::insufficient_customer_stock(
                line.cylinder_type_id,
                needed,
                balances.total(),
            ));
        }
    }
    Ok(())
}

/// Build the movement legs for a verified exchange, per order line:
///
/// 1. DELIVERY_FILLED — delivered quantity, vehicle to customer.
/// 2. CONVERSION — when the customer's empties don't cover the line's return
///    share, the gap is converted from the customer's filled stock (capped at
///    what they hold). These are cylinders handed back as empty while the
///    ledger still counted them filled.
/// 3. RETURN_EMPTY — the line's return share, customer to the chosen
///    destination.
///
/// Every leg carries the exchange id as its reference transaction, so the
/// compound apply is idempotent under retry. Run [`check_customer_stock`]
/// first; this function assumes the pre-check passed.
pub fn build_delivery_movements(
    exchange: &ExchangeTracking,
    customer_id: CustomerId,
    vehicle_id: VehicleId,
    lines: &[ExchangeLine],
    stock: &[CustomerStock],
    destination: ReturnDestination,
    actor: &str,
) -> DomainResult<Vec<MovementRequest>> {
    if lines.len() != stock.len() {
        return Err(DomainError::validation(
            "customer stock must be supplied for every order line",
        ));
    }
    let ordered: Vec<i64> = lines.iter().map(|l| l.ordered_quantity).collect();
    let returns = allocate_line_returns(
        &ordered,
        exchange.empty_collected(),
        exchange.expected_empty(),
    );

    let reference = Some(exchange.id().into());
    let at_customer = |status| StockPoint::new(Location::customer(customer_id), status);
    let mut legs = Vec::new();

    for ((line, balances), to_return) in lines.iter().zip(stock).zip(returns) {
        if line.delivered_quantity > 0 {
            legs.push(MovementRequest {
                cylinder_type_id: line.cylinder_type_id,
                source: Some(StockPoint::new(
                    Location::vehicle(vehicle_id),
                    CylinderStatus::Filled,
                )),
                destination: at_customer(CylinderStatus::Filled),
                quantity: line.delivered_quantity,
                movement_type: MovementType::DeliveryFilled,
                reference_transaction_id: reference,
                actor: actor.to_owned(),
                notes: None,
            });
        }

        let conversion = (to_return - balances.empty).clamp(0, balances.filled);
        if conversion > 0 {
            legs.push(MovementRequest {
                cylinder_type_id: line.cylinder_type_id,
                source: Some(at_customer(CylinderStatus::Filled)),
                destination: at_customer(CylinderStatus::Empty),
                quantity: conversion,
                movement_type: MovementType::Conversion,
                reference_transaction_id: reference,
                actor: actor.to_owned(),
                notes: Some("handed back empty, previously counted filled".to_owned()),
            });
        }

        if to_return > 0 {
            legs.push(MovementRequest {
                cylinder_type_id: line.cylinder_type_id,
                source: Some(at_customer(CylinderStatus::Empty)),
                destination: StockPoint::new(
                    destination.location(vehicle_id),
                    CylinderStatus::Empty,
                ),
                quantity: to_return,
                movement_type: MovementType::ReturnEmpty,
                reference_transaction_id: reference,
                actor: actor.to_owned(),
                notes: None,
            });
        }
    }

    Ok(legs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gasflow_core::{ExchangeId, OrderId};

    fn line(ordered: i64, delivered: i64) -> ExchangeLine {
        ExchangeLine {
            cylinder_type_id: CylinderTypeId::new(),
            ordered_quantity: ordered,
            delivered_quantity: delivered,
        }
    }

    fn exchange(collected: i64, expected: i64) -> ExchangeTracking {
        ExchangeTracking::record(
            ExchangeId::new(),
            OrderId::new(),
            50,
            collected,
            expected,
            Some("customer kept the difference".to_owned()),
            true,
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn precheck_fails_when_customer_cannot_cover_the_expected_return() {
        let lines = [line(50, 50)];
        let stock = [CustomerStock { empty: 10, filled: 5 }];
        let err = check_customer_stock(&lines, &stock, 40, 50).unwrap_err();
        assert_eq!(
            err,
            DomainError::insufficient_customer_stock(lines[0].cylinder_type_id, 50, 15)
        );
    }

    #[test]
    fn precheck_passes_when_empty_plus_filled_covers_it() {
        let lines = [line(50, 50)];
        let stock = [CustomerStock { empty: 10, filled: 45 }];
        assert!(check_customer_stock(&lines, &stock, 50, 50).is_ok());
    }

    #[test]
    fn precheck_fails_when_the_collection_itself_exceeds_customer_stock() {
        // Excess collection: 30 handed over against an expectation of 10,
        // from a customer holding only 10. The return is what must be
        // covered, not just the expectation.
        let lines = [line(10, 10)];
        let stock = [CustomerStock { empty: 10, filled: 0 }];
        let err = check_customer_stock(&lines, &stock, 30, 10).unwrap_err();
        assert_eq!(
            err,
            DomainError::insufficient_customer_stock(lines[0].cylinder_type_id, 30, 10)
        );
    }

    #[test]
    fn shortage_delivery_produces_delivery_conversion_and_return_legs() {
        // Customer holds 10 empty + 45 filled; 40 of 50 expected collected.
        let lines = [line(50, 50)];
        let stock = [CustomerStock { empty: 10, filled: 45 }];
        let exchange = exchange(40, 50);
        let customer = CustomerId::new();
        let vehicle = VehicleId::new();

        let legs = build_delivery_movements(
            &exchange,
            customer,
            vehicle,
            &lines,
            &stock,
            ReturnDestination::Yard,
            "driver-7",
        )
        .unwrap();

        assert_eq!(legs.len(), 3);

        assert_eq!(legs[0].movement_type, MovementType::DeliveryFilled);
        assert_eq!(legs[0].quantity, 50);
        assert_eq!(
            legs[0].source,
            Some(StockPoint::new(
                Location::vehicle(vehicle),
                CylinderStatus::Filled
            ))
        );
        assert_eq!(
            legs[0].destination,
            StockPoint::new(Location::customer(customer), CylinderStatus::Filled)
        );

        // 40 to return, only 10 empty on hand: 30 converted from filled.
        assert_eq!(legs[1].movement_type, MovementType::Conversion);
        assert_eq!(legs[1].quantity, 30);

        assert_eq!(legs[2].movement_type, MovementType::ReturnEmpty);
        assert_eq!(legs[2].quantity, 40);
        assert_eq!(
            legs[2].destination,
            StockPoint::new(Location::yard(), CylinderStatus::Empty)
        );

        for leg in &legs {
            assert_eq!(leg.reference_transaction_id, Some(exchange.id().into()));
        }
    }

    #[test]
    fn no_conversion_when_empties_cover_the_return() {
        let lines = [line(50, 50)];
        let stock = [CustomerStock { empty: 60, filled: 0 }];
        let legs = build_delivery_movements(
            &exchange(50, 50),
            CustomerId::new(),
            VehicleId::new(),
            &lines,
            &stock,
            ReturnDestination::Yard,
            "driver-7",
        )
        .unwrap();
        assert_eq!(legs.len(), 2);
        assert!(legs
            .iter()
            .all(|l| l.movement_type != MovementType::Conversion));
    }

    #[test]
    fn returns_can_stay_on_the_vehicle() {
        let lines = [line(50, 50)];
        let stock = [CustomerStock { empty: 60, filled: 0 }];
        let vehicle = VehicleId::new();
        let legs = build_delivery_movements(
            &exchange(50, 50),
            CustomerId::new(),
            vehicle,
            &lines,
            &stock,
            ReturnDestination::Vehicle,
            "driver-7",
        )
        .unwrap();
        let ret = legs
            .iter()
            .find(|l| l.movement_type == MovementType::ReturnEmpty)
            .unwrap();
        assert_eq!(
            ret.destination,
            StockPoint::new(Location::vehicle(vehicle), CylinderStatus::Empty)
        );
    }

    #[test]
    fn multi_line_returns_split_proportionally() {
        let lines = [line(30, 30), line(20, 20)];
        let stock = [
            CustomerStock { empty: 40, filled: 0 },
            CustomerStock { empty: 40, filled: 0 },
        ];
        let legs = build_delivery_movements(
            &exchange(45, 50),
            CustomerId::new(),
            VehicleId::new(),
            &lines,
            &stock,
            ReturnDestination::Yard,
            "driver-7",
        )
        .unwrap();
        let returns: Vec<i64> = legs
            .iter()
            .filter(|l| l.movement_type == MovementType::ReturnEmpty)
            .map(|l| l.quantity)
            .collect();
        assert_eq!(returns, vec![27, 18]);
    }

    #[test]
    fn mismatched_stock_slice_is_rejected() {
        let lines = [line(30, 30), line(20, 20)];
        let stock = [CustomerStock { empty: 40, filled: 0 }];
        assert!(check_customer_stock(&lines, &stock, 50, 50).is_err());
    }
}
