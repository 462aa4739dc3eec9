use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::{HotelError, Result};

/// unique identifier for a booking
pub type BookingId = Uuid;

/// unique identifier for a payment
pub type PaymentId = Uuid;

/// unique identifier for an invoice
pub type InvoiceId = Uuid;

/// guest name, trimmed and never blank
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GuestName(String);

impl GuestName {
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(HotelError::MissingGuestName);
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GuestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for GuestName {
    type Error = HotelError;

    fn try_from(value: String) -> Result<Self> {
        GuestName::new(value)
    }
}

impl From<GuestName> for String {
    fn from(name: GuestName) -> Self {
        name.0
    }
}

/// room number as printed on the door
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomNumber(String);

impl RoomNumber {
    pub fn new(number: impl AsRef<str>) -> Result<Self> {
        let number = number.as_ref().trim();
        if number.is_empty() {
            return Err(HotelError::MissingRoomNumber);
        }
        Ok(Self(number.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomNumber {
    type Error = HotelError;

    fn try_from(value: String) -> Result<Self> {
        RoomNumber::new(value)
    }
}

impl From<RoomNumber> for String {
    fn from(number: RoomNumber) -> Self {
        number.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_name_is_trimmed() {
        let name = GuestName::new("  Lisa Müller ").unwrap();
        assert_eq!(name.as_str(), "Lisa Müller");
    }

    #[test]
    fn test_blank_names_rejected() {
        assert_eq!(GuestName::new("   "), Err(HotelError::MissingGuestName));
        assert_eq!(RoomNumber::new(""), Err(HotelError::MissingRoomNumber));
    }

    #[test]
    fn test_serde_validates_on_the_way_in() {
        let room: RoomNumber = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(room.to_string(), "12");
        assert!(serde_json::from_str::<GuestName>("\"\"").is_err());
    }
}
