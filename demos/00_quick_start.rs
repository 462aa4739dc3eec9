/// quick start - price, book and check in
use hotel_desk_rs::{DateInterval, GuestName, Hotel, HotelConfig, SafeTimeProvider, TimeSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let hotel = Hotel::with_rooms(HotelConfig::standard(), ["101", "102"])?;
    let stay = DateInterval::from_ymd((2024, 5, 3), (2024, 5, 6))?;

    println!("price for {}: {}", stay, hotel.request_price(&stay)?);

    let room = hotel.book_room_now(&stay, "Peter Meier")?;
    println!("booked room {room}");

    let guest = GuestName::new("Peter Meier")?;
    let time = SafeTimeProvider::new(TimeSource::System);
    let rooms = hotel.check_in(&guest, stay.arrival(), &time)?;
    println!("checked in to {rooms:?}");

    Ok(())
}
