pub mod booking;
pub mod calendar;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod hotel;
pub mod payments;
pub mod room;
pub mod settlement;
pub mod store;
pub mod types;

// re-export key types
pub use booking::{Booking, BookingRequest};
pub use calendar::DateInterval;
pub use config::HotelConfig;
pub use decimal::Money;
pub use errors::{ErrorKind, HotelError, Result};
pub use events::{Event, EventStore};
pub use hotel::Hotel;
pub use payments::{AllocationResult, Payment, PaymentAllocation, PaymentLedger};
pub use room::Room;
pub use settlement::{Invoice, SettlementEngine};
pub use store::{
    InMemoryInvoiceStore, InMemoryPaymentStore, InMemoryRoomStore, InvoiceStore, PaymentStore,
    RoomStore,
};
pub use types::{BookingId, GuestName, InvoiceId, PaymentId, RoomNumber};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
