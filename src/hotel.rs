use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info, warn};

use crate::booking::{Booking, BookingRequest};
use crate::calendar::DateInterval;
use crate::config::HotelConfig;
use crate::decimal::Money;
use crate::errors::{HotelError, Result};
use crate::events::{Event, EventStore};
use crate::room::Room;
use crate::store::{InMemoryRoomStore, RoomStore};
use crate::types::{GuestName, RoomNumber};

/// front desk: pricing, booking and the guest's stay
pub struct Hotel<R: RoomStore = InMemoryRoomStore> {
    config: Arc<HotelConfig>,
    rooms: Arc<R>,
    events: Mutex<EventStore>,
}

impl<R: RoomStore> Hotel<R> {
    pub fn new(config: HotelConfig, rooms: Arc<R>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            rooms,
            events: Mutex::new(EventStore::new()),
        })
    }

    pub fn config(&self) -> &HotelConfig {
        &self.config
    }

    /// the validated configuration, for services that must bill at the quoted rate
    pub fn shared_config(&self) -> Arc<HotelConfig> {
        Arc::clone(&self.config)
    }

    pub fn room_store(&self) -> Arc<R> {
        Arc::clone(&self.rooms)
    }

    /// add an empty room at the end of the search order
    pub fn add_room(&self, number: RoomNumber) -> Result<()> {
        if !self.rooms.insert_new(Room::new(number.clone())) {
            warn!(room = %number, "room already exists");
            return Err(HotelError::DuplicateRoom { room: number });
        }
        info!(room = %number, "room added");
        self.emit(Event::RoomAdded { room: number });
        Ok(())
    }

    /// rooms in search order
    pub fn rooms(&self) -> Vec<Room> {
        self.rooms.all_rooms()
    }

    pub fn bookings_for(&self, guest: &GuestName) -> Vec<Booking> {
        self.rooms.bookings_for(guest)
    }

    /// price of the stay in the first free room
    pub fn request_price(&self, interval: &DateInterval) -> Result<Money> {
        let free = self.rooms.all_rooms().into_iter().find(|room| room.is_free(interval));
        match free {
            Some(room) => {
                let price = self
                    .config
                    .nightly_rate
                    .checked_times(interval.nights())
                    .ok_or_else(|| HotelError::AmountOverflow {
                        operation: format!("price of stay {interval}"),
                    })?;
                debug!(room = %room.number, %interval, %price, "room available");
                Ok(price)
            }
            None => {
                debug!(%interval, "no room available");
                Err(HotelError::NoRoomAvailable {
                    arrival: interval.arrival(),
                    departure: interval.departure(),
                })
            }
        }
    }

    /// book the first free room with system time
    pub fn book_room_now(&self, interval: &DateInterval, guest: &str) -> Result<RoomNumber> {
        let time = SafeTimeProvider::new(hourglass_rs::TimeSource::System);
        self.book_room(interval, guest, &time)
    }

    pub fn book_room(
        &self,
        interval: &DateInterval,
        guest: &str,
        time_provider: &SafeTimeProvider,
    ) -> Result<RoomNumber> {
        let request = BookingRequest::new(*interval, guest).map_err(|e| {
            warn!(%interval, "booking rejected: {e}");
            e
        })?;
        self.book(request, time_provider)
    }

    /// book the first free room, in insertion order.
    ///
    /// Freedom is re-checked inside the room update, so a room taken since
    /// the scan is skipped rather than double-booked.
    pub fn book(&self, request: BookingRequest, time_provider: &SafeTimeProvider) -> Result<RoomNumber> {
        let interval = request.interval;
        let now = time_provider.now();

        for candidate in self.rooms.all_rooms() {
            if !candidate.is_free(&interval) {
                continue;
            }
            let booked = self.rooms.update(&candidate.number, |room| {
                if !room.is_free(&interval) {
                    return None;
                }
                let booking = request.clone().confirm(now);
                let booking_id = booking.id;
                room.bookings.push(booking);
                Some(booking_id)
            });

            if let Some(Some(booking_id)) = booked {
                info!(
                    room = %candidate.number,
                    guest = %request.guest,
                    %interval,
                    %booking_id,
                    "room booked"
                );
                self.emit(Event::RoomBooked {
                    room: candidate.number.clone(),
                    booking_id,
                    guest: request.guest.clone(),
                    arrival: interval.arrival(),
                    departure: interval.departure(),
                    timestamp: now,
                });
                return Ok(candidate.number);
            }
        }

        warn!(guest = %request.guest, %interval, "no rooms available");
        Err(HotelError::NoRoomAvailable {
            arrival: interval.arrival(),
            departure: interval.departure(),
        })
    }

    /// check in every booking of `guest` arriving on `arrival`.
    ///
    /// A guest with bookings on other days gets an empty list, not an error.
    pub fn check_in(
        &self,
        guest: &GuestName,
        arrival: NaiveDate,
        time_provider: &SafeTimeProvider,
    ) -> Result<Vec<RoomNumber>> {
        let rooms_for_guest = self.rooms.rooms_with_bookings_for(guest);
        if rooms_for_guest.is_empty() {
            warn!(guest = %guest, "check-in without booking");
            return Err(HotelError::GuestHasNoBookings { guest: guest.clone() });
        }

        let now = time_provider.now();
        let mut checked_in_rooms = Vec::new();

        for room in rooms_for_guest {
            // already checked-in bookings still count, but emit nothing
            let (matched, newly_checked_in) = self
                .rooms
                .update(&room.number, |room| {
                    let mut matched = false;
                    let mut newly_checked_in = Vec::new();
                    for booking in room
                        .bookings
                        .iter_mut()
                        .filter(|b| b.belongs_to(guest) && b.arrival() == arrival)
                    {
                        matched = true;
                        if !booking.checked_in {
                            booking.check_in();
                            newly_checked_in.push(booking.id);
                        }
                    }
                    (matched, newly_checked_in)
                })
                .unwrap_or_default();

            if !matched {
                continue;
            }
            for booking_id in newly_checked_in {
                self.emit(Event::GuestCheckedIn {
                    room: room.number.clone(),
                    booking_id,
                    guest: guest.clone(),
                    timestamp: now,
                });
            }
            checked_in_rooms.push(room.number);
        }

        info!(guest = %guest, %arrival, rooms = ?checked_in_rooms, "guest checked in");
        Ok(checked_in_rooms)
    }

    /// check out the single invoiced booking of `guest` in `room` leaving on `departure`
    pub fn check_out(
        &self,
        guest: &GuestName,
        room: &RoomNumber,
        departure: NaiveDate,
        time_provider: &SafeTimeProvider,
    ) -> Result<Booking> {
        let outcome = self
            .rooms
            .update(room, |r| {
                let matches: Vec<usize> = r
                    .bookings
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| b.belongs_to(guest) && b.departure() == departure)
                    .map(|(i, _)| i)
                    .collect();

                let index = match matches.as_slice() {
                    [] => {
                        return Err(HotelError::NoBookingToCheckOut {
                            guest: guest.clone(),
                            room: room.clone(),
                            departure,
                        })
                    }
                    [index] => *index,
                    _ => {
                        return Err(HotelError::AmbiguousCheckOut {
                            guest: guest.clone(),
                            room: room.clone(),
                            departure,
                            count: matches.len(),
                        })
                    }
                };

                let booking = &mut r.bookings[index];
                if !booking.invoiced {
                    return Err(HotelError::NotInvoiced { booking_id: booking.id });
                }
                booking.check_out();
                Ok(booking.clone())
            })
            .ok_or_else(|| HotelError::RoomNotFound { room: room.clone() })?;

        let booking = outcome.map_err(|e| {
            warn!(guest = %guest, room = %room, %departure, "check-out rejected: {e}");
            e
        })?;

        info!(guest = %guest, room = %room, booking_id = %booking.id, "guest checked out");
        self.emit(Event::GuestCheckedOut {
            room: room.clone(),
            booking_id: booking.id,
            guest: guest.clone(),
            timestamp: time_provider.now(),
        });
        Ok(booking)
    }

    pub fn take_events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take_events()
    }

    fn emit(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .emit(event);
    }
}

impl Hotel<InMemoryRoomStore> {
    /// hotel over a fresh in-memory directory holding the given rooms
    pub fn with_rooms<I, S>(config: HotelConfig, numbers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(config, Arc::new(InMemoryRoomStore::with_rooms(numbers)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 10, d).unwrap()
    }

    fn stay(arrival: u32, departure: u32) -> DateInterval {
        DateInterval::new(date(arrival), date(departure)).unwrap()
    }

    fn guest(name: &str) -> GuestName {
        GuestName::new(name).unwrap()
    }

    fn room(n: &str) -> RoomNumber {
        RoomNumber::new(n).unwrap()
    }

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2020, 10, 1, 8, 0, 0).unwrap(),
        ))
    }

    fn hotel(rooms: &[&str]) -> Hotel {
        Hotel::with_rooms(HotelConfig::standard(), rooms.iter().copied()).unwrap()
    }

    #[test]
    fn test_price_before_and_after_booking() {
        let hotel = hotel(&["1"]);
        let time = test_time();

        assert_eq!(hotel.request_price(&stay(10, 11)).unwrap(), Money::from_major(100));

        hotel.book_room(&stay(10, 11), "Peter", &time).unwrap();

        let err = hotel.request_price(&stay(10, 11)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAvailable);
    }

    #[test]
    fn test_price_scales_with_nights_and_rate() {
        let hotel = Hotel::with_rooms(HotelConfig::with_nightly_rate(Money::from_major(80)), ["1"]).unwrap();

        assert_eq!(hotel.request_price(&stay(10, 13)).unwrap(), Money::from_major(240));
    }

    #[test]
    fn test_booking_takes_first_free_room_in_insertion_order() {
        let hotel = hotel(&["3", "1", "2"]);
        let time = test_time();

        assert_eq!(hotel.book_room(&stay(10, 12), "Peter", &time).unwrap(), room("3"));
        assert_eq!(hotel.book_room(&stay(11, 13), "Lisa", &time).unwrap(), room("1"));
        // turnover on the 12th, room 3 is free again
        assert_eq!(hotel.book_room(&stay(12, 14), "Hans", &time).unwrap(), room("3"));
    }

    #[test]
    fn test_same_day_turnover_books_same_room() {
        let hotel = hotel(&["1"]);
        let time = test_time();

        hotel.book_room(&stay(10, 11), "Peter", &time).unwrap();
        assert_eq!(hotel.book_room(&stay(11, 12), "Lisa", &time).unwrap(), room("1"));
        assert_eq!(hotel.rooms()[0].bookings.len(), 2);
    }

    #[test]
    fn test_blank_guest_rejected_without_mutation() {
        let hotel = hotel(&["1"]);

        let err = hotel.book_room(&stay(10, 11), "  ", &test_time()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(hotel.rooms()[0].bookings.is_empty());
    }

    #[test]
    fn test_fully_booked_fails_without_mutation() {
        let hotel = hotel(&["1", "2"]);
        let time = test_time();
        hotel.book_room(&stay(10, 12), "Peter", &time).unwrap();
        hotel.book_room(&stay(10, 12), "Lisa", &time).unwrap();

        let err = hotel.book_room(&stay(11, 12), "Hans", &time).unwrap_err();

        assert_eq!(err, HotelError::NoRoomAvailable { arrival: date(11), departure: date(12) });
        assert!(hotel.rooms().iter().all(|r| r.bookings.len() == 1));
    }

    #[test]
    fn test_new_booking_starts_unchecked() {
        let hotel = hotel(&["1"]);
        hotel.book_room(&stay(10, 11), "Peter", &test_time()).unwrap();

        let booking = &hotel.bookings_for(&guest("Peter"))[0];
        assert!(!booking.checked_in && !booking.invoiced && !booking.checked_out);
    }

    #[test]
    fn test_check_in_without_booking_fails() {
        let hotel = hotel(&["1"]);

        let err = hotel.check_in(&guest("Peter"), date(10), &test_time()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_check_in_marks_every_matching_booking() {
        let hotel = hotel(&["1", "2", "3"]);
        let time = test_time();
        let peter = guest("Peter");
        hotel.book_room(&stay(10, 11), "Peter", &time).unwrap();
        hotel.book_room(&stay(10, 12), "Peter", &time).unwrap();
        hotel.book_room(&stay(10, 11), "Lisa", &time).unwrap();

        let rooms = hotel.check_in(&peter, date(10), &time).unwrap();

        assert_eq!(rooms, vec![room("1"), room("2")]);
        assert!(hotel.bookings_for(&peter).iter().all(|b| b.checked_in));
        assert!(hotel.bookings_for(&guest("Lisa")).iter().all(|b| !b.checked_in));
    }

    #[test]
    fn test_check_in_repeat_bookings_in_one_room() {
        let hotel = hotel(&["1"]);
        let time = test_time();
        let peter = guest("Peter");
        hotel.book_room(&stay(10, 10), "Peter", &time).unwrap();
        hotel.book_room(&stay(10, 10), "Peter", &time).unwrap();

        let rooms = hotel.check_in(&peter, date(10), &time).unwrap();

        assert_eq!(rooms, vec![room("1")]);
        assert_eq!(hotel.bookings_for(&peter).iter().filter(|b| b.checked_in).count(), 2);
    }

    #[test]
    fn test_check_in_on_wrong_date_checks_in_nothing() {
        let hotel = hotel(&["1"]);
        let time = test_time();
        let peter = guest("Peter");
        hotel.book_room(&stay(10, 11), "Peter", &time).unwrap();

        let rooms = hotel.check_in(&peter, date(9), &time).unwrap();

        assert!(rooms.is_empty());
        assert!(!hotel.bookings_for(&peter)[0].checked_in);
    }

    #[test]
    fn test_check_out_requires_invoice() {
        let hotel = hotel(&["1"]);
        let time = test_time();
        let peter = guest("Peter");
        hotel.book_room(&stay(10, 11), "Peter", &time).unwrap();
        hotel.check_in(&peter, date(10), &time).unwrap();

        let err = hotel.check_out(&peter, &room("1"), date(11), &time).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert!(err.to_string().contains("invoiced"));
        assert!(!hotel.bookings_for(&peter)[0].checked_out);
    }

    #[test]
    fn test_check_out_of_invoiced_booking() {
        let hotel = hotel(&["1"]);
        let time = test_time();
        let peter = guest("Peter");
        hotel.book_room(&stay(10, 11), "Peter", &time).unwrap();
        hotel.check_in(&peter, date(10), &time).unwrap();
        hotel.rooms.update(&room("1"), |r| r.bookings[0].mark_invoiced());

        let booking = hotel.check_out(&peter, &room("1"), date(11), &time).unwrap();

        assert!(booking.checked_out);
        assert!(hotel.bookings_for(&peter)[0].checked_out);
    }

    #[test]
    fn test_check_out_ambiguous() {
        let hotel = hotel(&["1"]);
        let time = test_time();
        let peter = guest("Peter");
        hotel.book_room(&stay(10, 10), "Peter", &time).unwrap();
        hotel.book_room(&stay(10, 10), "Peter", &time).unwrap();

        let err = hotel.check_out(&peter, &room("1"), date(10), &time).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AmbiguousState);
    }

    #[test]
    fn test_check_out_nothing_to_check_out() {
        let hotel = hotel(&["1"]);
        let time = test_time();
        hotel.book_room(&stay(10, 11), "Peter", &time).unwrap();

        let wrong_date = hotel.check_out(&guest("Peter"), &room("1"), date(12), &time).unwrap_err();
        assert!(matches!(wrong_date, HotelError::NoBookingToCheckOut { .. }));

        let unknown_room = hotel.check_out(&guest("Peter"), &room("9"), date(11), &time).unwrap_err();
        assert_eq!(unknown_room.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_add_room_extends_search_order() {
        let hotel = hotel(&["1"]);
        let time = test_time();
        hotel.book_room(&stay(10, 11), "Peter", &time).unwrap();

        hotel.add_room(room("2")).unwrap();
        assert!(hotel.add_room(room("2")).is_err());

        assert_eq!(hotel.book_room(&stay(10, 11), "Lisa", &time).unwrap(), room("2"));
    }

    #[test]
    fn test_concurrent_add_room_admits_one() {
        let hotel = hotel(&["1"]);

        let results: Vec<Result<()>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| hotel.add_room(room("2")))).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(hotel.rooms().len(), 2);
    }

    #[test]
    fn test_re_adding_a_room_keeps_its_bookings() {
        let hotel = hotel(&["1"]);
        hotel.book_room(&stay(10, 11), "Peter", &test_time()).unwrap();

        let err = hotel.add_room(room("1")).unwrap_err();

        assert_eq!(err, HotelError::DuplicateRoom { room: room("1") });
        assert_eq!(hotel.bookings_for(&guest("Peter")).len(), 1);
    }

    #[test]
    fn test_repeated_check_in_emits_no_new_events() {
        let hotel = hotel(&["1"]);
        let time = test_time();
        let peter = guest("Peter");
        hotel.book_room(&stay(10, 11), "Peter", &time).unwrap();

        hotel.check_in(&peter, date(10), &time).unwrap();
        hotel.take_events();
        let rooms = hotel.check_in(&peter, date(10), &time).unwrap();

        assert_eq!(rooms, vec![room("1")]);
        assert!(hotel.take_events().is_empty());
    }

    #[test]
    fn test_events_follow_the_stay() {
        let hotel = hotel(&["1"]);
        let time = test_time();
        let peter = guest("Peter");
        hotel.book_room(&stay(10, 11), "Peter", &time).unwrap();
        hotel.check_in(&peter, date(10), &time).unwrap();

        let events = hotel.take_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::RoomBooked { .. }));
        assert!(matches!(events[1], Event::GuestCheckedIn { .. }));
        assert!(hotel.take_events().is_empty());
    }
}
