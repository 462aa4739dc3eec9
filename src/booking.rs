use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::DateInterval;
use crate::decimal::Money;
use crate::errors::Result;
use crate::types::{BookingId, GuestName};

/// validated request to book a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub interval: DateInterval,
    pub guest: GuestName,
}

impl BookingRequest {
    pub fn new(interval: DateInterval, guest: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            interval,
            guest: GuestName::new(guest)?,
        })
    }

    /// turn the request into a fresh, unchecked-in booking
    pub fn confirm(self, booked_at: DateTime<Utc>) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            interval: self.interval,
            guest: self.guest,
            booked_at,
            checked_in: false,
            invoiced: false,
            checked_out: false,
        }
    }
}

/// one reservation of one room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub interval: DateInterval,
    pub guest: GuestName,
    pub booked_at: DateTime<Utc>,
    pub checked_in: bool,
    pub invoiced: bool,
    pub checked_out: bool,
}

impl Booking {
    pub fn arrival(&self) -> NaiveDate {
        self.interval.arrival()
    }

    pub fn departure(&self) -> NaiveDate {
        self.interval.departure()
    }

    pub fn nights(&self) -> u32 {
        self.interval.nights()
    }

    /// true if this booking occupies the room on `date`
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.interval.contains(date)
    }

    pub fn belongs_to(&self, guest: &GuestName) -> bool {
        &self.guest == guest
    }

    /// amount owed for the stay at the given nightly rate, `None` on overflow
    pub fn price(&self, nightly_rate: Money) -> Option<Money> {
        nightly_rate.checked_times(self.nights())
    }

    /// checked in, not yet invoiced and running at least through `departure`
    pub fn is_invoiceable(&self, guest: &GuestName, departure: NaiveDate) -> bool {
        self.belongs_to(guest) && departure <= self.departure() && !self.invoiced && self.checked_in
    }

    pub fn check_in(&mut self) {
        self.checked_in = true;
    }

    /// invoiced is sticky; nothing resets it
    pub fn mark_invoiced(&mut self) {
        self.invoiced = true;
    }

    /// caller must have verified the booking is invoiced
    pub(crate) fn check_out(&mut self) {
        debug_assert!(self.invoiced, "checkout requires an invoiced booking");
        self.checked_out = true;
    }
}
