use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::booking::Booking;
use crate::calendar::DateInterval;
use crate::types::{GuestName, RoomNumber};

/// a room and the bookings it owns, in booking order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub number: RoomNumber,
    pub bookings: Vec<Booking>,
}

impl Room {
    pub fn new(number: RoomNumber) -> Self {
        Self {
            number,
            bookings: Vec::new(),
        }
    }

    fn date_is_free(&self, date: NaiveDate) -> bool {
        !self.bookings.iter().any(|b| b.contains(date))
    }

    /// free iff no owned booking covers any day of `interval`.
    /// checked day by day so a departure on another stay's arrival day is a turnover, not a clash
    pub fn is_free(&self, interval: &DateInterval) -> bool {
        interval.days().all(|date| self.date_is_free(date))
    }

    pub fn has_bookings_for(&self, guest: &GuestName) -> bool {
        self.bookings.iter().any(|b| b.belongs_to(guest))
    }

    pub fn bookings_for<'a>(&'a self, guest: &'a GuestName) -> impl Iterator<Item = &'a Booking> + 'a {
        self.bookings.iter().filter(move |b| b.belongs_to(guest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::BookingRequest;
    use chrono::Utc;

    fn interval(arrival: u32, departure: u32) -> DateInterval {
        DateInterval::new(
            NaiveDate::from_ymd_opt(2020, 10, arrival).unwrap(),
            NaiveDate::from_ymd_opt(2020, 10, departure).unwrap(),
        )
        .unwrap()
    }

    fn room_with(stays: &[(u32, u32)]) -> Room {
        let mut room = Room::new(RoomNumber::new("1").unwrap());
        for &(a, d) in stays {
            let request = BookingRequest::new(interval(a, d), "Peter").unwrap();
            room.bookings.push(request.confirm(Utc::now()));
        }
        room
    }

    #[test]
    fn test_empty_room_is_free() {
        assert!(room_with(&[]).is_free(&interval(10, 20)));
    }

    #[test]
    fn test_overlap_is_rejected() {
        let room = room_with(&[(10, 13)]);

        assert!(!room.is_free(&interval(10, 13)));
        assert!(!room.is_free(&interval(12, 14)));
        assert!(!room.is_free(&interval(8, 11)));
        assert!(!room.is_free(&interval(11, 12)));
        assert!(!room.is_free(&interval(5, 20)));
    }

    #[test]
    fn test_same_day_turnover_is_free() {
        let room = room_with(&[(10, 13)]);

        assert!(room.is_free(&interval(13, 15)));
        assert!(room.is_free(&interval(8, 10)));
    }

    #[test]
    fn test_gap_between_bookings() {
        let room = room_with(&[(10, 12), (15, 18)]);

        assert!(room.is_free(&interval(12, 15)));
        assert!(!room.is_free(&interval(12, 16)));
    }

    #[test]
    fn test_zero_length_interval_is_trivially_free() {
        let room = room_with(&[(10, 13)]);

        // inside an existing stay, still free because no day is requested
        assert!(room.is_free(&interval(11, 11)));
    }

    #[test]
    fn test_bookings_for_guest() {
        let mut room = room_with(&[(10, 11)]);
        let lisa = BookingRequest::new(interval(12, 13), "Lisa").unwrap();
        room.bookings.push(lisa.confirm(Utc::now()));

        let peter = GuestName::new("Peter").unwrap();
        assert!(room.has_bookings_for(&peter));
        assert_eq!(room.bookings_for(&peter).count(), 1);
        assert!(!room.has_bookings_for(&GuestName::new("Hans").unwrap()));
    }
}
