use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{HotelError, Result};

/// half-open stay interval `[arrival, departure)` at day granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateInterval {
    arrival: NaiveDate,
    departure: NaiveDate,
}

impl DateInterval {
    /// create an interval; arrival == departure is allowed and covers no days
    pub fn new(arrival: NaiveDate, departure: NaiveDate) -> Result<Self> {
        if arrival > departure {
            return Err(HotelError::InvalidInterval { arrival, departure });
        }
        Ok(Self { arrival, departure })
    }

    /// create from calendar parts
    pub fn from_ymd(arrival: (i32, u32, u32), departure: (i32, u32, u32)) -> Result<Self> {
        let arrival_date = ymd(arrival)?;
        let departure_date = ymd(departure)?;
        Self::new(arrival_date, departure_date)
    }

    pub fn arrival(&self) -> NaiveDate {
        self.arrival
    }

    pub fn departure(&self) -> NaiveDate {
        self.departure
    }

    /// true if the guest occupies the room on the night starting at `date`
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.arrival <= date && date < self.departure
    }

    /// every occupied day, arrival first, departure excluded
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let departure = self.departure;
        self.arrival.iter_days().take_while(move |d| *d < departure)
    }

    /// number of nights billed for the stay
    pub fn nights(&self) -> u32 {
        (self.departure - self.arrival).num_days().max(0) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.arrival == self.departure
    }
}

impl fmt::Display for DateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.arrival, self.departure)
    }
}

fn ymd((year, month, day): (i32, u32, u32)) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| HotelError::InvalidDate {
        message: format!("{year:04}-{month:02}-{day:02} is not a calendar date"),
    })
}
