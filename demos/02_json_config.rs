/// json config - load rates from a json document
use hotel_desk_rs::{DateInterval, Hotel, HotelConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = HotelConfig::from_json(
        r#"{
            "nightly_rate": "89.90",
            "currency": "CHF"
        }"#,
    )?;
    println!("config:\n{}", config.to_json()?);

    let hotel = Hotel::with_rooms(config, ["A1"])?;
    let week = DateInterval::from_ymd((2024, 7, 1), (2024, 7, 8))?;
    println!(
        "a week in A1 costs {} {}",
        hotel.request_price(&week)?,
        hotel.config().currency
    );

    match HotelConfig::from_json(r#"{ "nightly_rate": "-1" }"#) {
        Ok(_) => println!("unexpected: negative rate accepted"),
        Err(e) => println!("rejected: {e}"),
    }

    Ok(())
}
