//! Delivery order lifecycle (state machine gated on exchange verification).

mod order;

pub use order::{
    AddLine, AssignToPlan, CancelOrder, ConfirmOrder, CreateOrder, DeliveryOrder,
    DeliveryOrderCommand, DeliveryOrderEvent, LineAdded, MarkDelivered, MarkLoaded, OrderAssigned,
    OrderCancelled, OrderConfirmed, OrderCreated, OrderDelivered, OrderInTransit, OrderLine,
    OrderLoaded, OrderStatus, StartTransit,
};
