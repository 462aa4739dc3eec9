use chrono::NaiveDate;
use thiserror::Error;

use crate::decimal::Money;
use crate::types::{GuestName, RoomNumber};

/// broad failure classes callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotAvailable,
    NotFound,
    AmbiguousState,
    PreconditionFailed,
    InsufficientFunds,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HotelError {
    #[error("guest name must be provided")]
    MissingGuestName,

    #[error("room number must be provided")]
    MissingRoomNumber,

    #[error("invalid date interval: arrival {arrival} is after departure {departure}")]
    InvalidInterval {
        arrival: NaiveDate,
        departure: NaiveDate,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("no rooms to invoice were given")]
    NoRoomsRequested,

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("amount overflow in {operation}")]
    AmountOverflow {
        operation: String,
    },

    #[error("room {room} already exists")]
    DuplicateRoom {
        room: RoomNumber,
    },

    #[error("no room available from {arrival} to {departure}")]
    NoRoomAvailable {
        arrival: NaiveDate,
        departure: NaiveDate,
    },

    #[error("guest '{guest}' cannot check in because they did not book a room")]
    GuestHasNoBookings {
        guest: GuestName,
    },

    #[error("room {room} not found")]
    RoomNotFound {
        room: RoomNumber,
    },

    #[error("invoice {id} not found")]
    InvoiceNotFound {
        id: uuid::Uuid,
    },

    #[error("no booking to check out for guest '{guest}' in room {room} departing {departure}")]
    NoBookingToCheckOut {
        guest: GuestName,
        room: RoomNumber,
        departure: NaiveDate,
    },

    #[error("more than one booking found: {count} bookings for guest '{guest}' in room {room} departing {departure}")]
    AmbiguousCheckOut {
        guest: GuestName,
        room: RoomNumber,
        departure: NaiveDate,
        count: usize,
    },

    #[error("checkout only possible for invoiced bookings")]
    NotInvoiced {
        booking_id: uuid::Uuid,
    },

    #[error("no bookings to be invoiced for guest '{guest}', departure date {departure} and rooms {}", format_rooms(.rooms))]
    NothingToInvoice {
        guest: GuestName,
        departure: NaiveDate,
        rooms: Vec<RoomNumber>,
    },

    #[error("payment insufficient: required {required}, available {available}, necessary payment {shortfall}")]
    InsufficientFunds {
        required: Money,
        available: Money,
        shortfall: Money,
    },
}

impl HotelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HotelError::MissingGuestName
            | HotelError::MissingRoomNumber
            | HotelError::InvalidInterval { .. }
            | HotelError::InvalidDate { .. }
            | HotelError::InvalidPaymentAmount { .. }
            | HotelError::NoRoomsRequested
            | HotelError::InvalidConfiguration { .. }
            | HotelError::AmountOverflow { .. }
            | HotelError::DuplicateRoom { .. } => ErrorKind::InvalidArgument,
            HotelError::NoRoomAvailable { .. } => ErrorKind::NotAvailable,
            HotelError::GuestHasNoBookings { .. }
            | HotelError::RoomNotFound { .. }
            | HotelError::InvoiceNotFound { .. } => ErrorKind::NotFound,
            HotelError::AmbiguousCheckOut { .. } => ErrorKind::AmbiguousState,
            HotelError::NoBookingToCheckOut { .. }
            | HotelError::NotInvoiced { .. }
            | HotelError::NothingToInvoice { .. } => ErrorKind::PreconditionFailed,
            HotelError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
        }
    }
}

fn format_rooms(rooms: &[RoomNumber]) -> String {
    let names: Vec<&str> = rooms.iter().map(RoomNumber::as_str).collect();
    format!("[{}]", names.join(", "))
}

pub type Result<T> = std::result::Result<T, HotelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_message_carries_shortfall() {
        let err = HotelError::InsufficientFunds {
            required: Money::from_major(100),
            available: Money::from_major(50),
            shortfall: Money::from_major(50),
        };
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert!(err.to_string().contains("necessary payment 50.00"));
    }

    #[test]
    fn test_nothing_to_invoice_lists_every_room() {
        let err = HotelError::NothingToInvoice {
            guest: GuestName::new("Peter Meier").unwrap(),
            departure: NaiveDate::from_ymd_opt(2020, 10, 11).unwrap(),
            rooms: vec![RoomNumber::new("1").unwrap(), RoomNumber::new("2").unwrap()],
        };
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        let message = err.to_string();
        assert!(message.contains("'Peter Meier'"));
        assert!(message.contains("2020-10-11"));
        assert!(message.contains("[1, 2]"));
    }
}
