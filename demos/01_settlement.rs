/// settlement - pay in instalments, invoice, check out
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use hotel_desk_rs::{
    DateInterval, GuestName, Hotel, HotelConfig, InMemoryInvoiceStore, InMemoryRoomStore, Money,
    PaymentLedger, RoomNumber, SafeTimeProvider, SettlementEngine, TimeSource,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let rooms = Arc::new(InMemoryRoomStore::with_rooms(["1", "2"])?);
    let hotel = Hotel::new(HotelConfig::standard(), rooms)?;
    let settlement = SettlementEngine::for_hotel(
        &hotel,
        Arc::new(PaymentLedger::in_memory()),
        Arc::new(InMemoryInvoiceStore::new()),
    );

    let guest = GuestName::new("Lisa Müller")?;
    let stay = DateInterval::from_ymd((2024, 5, 3), (2024, 5, 5))?;
    let room = hotel.book_room(&stay, guest.as_str(), &time)?;

    // deposit now, the rest on arrival
    settlement.ledger().pay(&guest, Money::from_major(70), &time)?;
    controller.advance(Duration::days(2));
    hotel.check_in(&guest, stay.arrival(), &time)?;
    settlement.ledger().pay(&guest, Money::from_major(150), &time)?;
    println!("credit before invoice: {}", settlement.ledger().remaining_credit(&guest));

    controller.advance(Duration::days(2));
    let invoice = settlement.produce_invoice(&guest, stay.departure(), &[room.clone()], &time)?;
    println!("invoice {} total {}", invoice.id, invoice.total_amount);
    for payment in settlement.ledger().payments(&guest) {
        println!("  paid {} used {}", payment.paid_amount, payment.used_amount);
    }
    println!("credit after invoice: {}", settlement.ledger().remaining_credit(&guest));

    // a second invoice for the same stay finds nothing left
    if let Err(e) = settlement.produce_invoice(&guest, stay.departure(), &[room.clone()], &time) {
        println!("second invoice refused: {e}");
    }

    let booking = hotel.check_out(&guest, &room, stay.departure(), &time)?;
    println!("checked out booking {}", booking.id);

    let other = RoomNumber::new("2")?;
    if let Err(e) = hotel.check_out(&guest, &other, stay.departure(), &time) {
        println!("room {other}: {e}");
    }

    Ok(())
}
