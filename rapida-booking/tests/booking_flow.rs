//! End-to-end booking flow against the in-process store: seat accounting,
//! cancellation windows, lookup round-trips, and concurrent bookers racing
//! for the last seat.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use rapida_booking::{BookingError, CreateReservationRequest, ReservationService, SeatOccupancy};
use rapida_core::identity::FixedIdentity;
use rapida_core::{ReservationStore, TripStore};
use rapida_domain::{Passenger, PaymentMethod, ServiceTier, Trip, TripSnapshot};
use rapida_store::app_config::BookingRules;
use rapida_store::MemoryStore;

fn make_trip(departure: DateTime<Utc>, seats_total: i32, seats_available: i32) -> Trip {
    Trip {
        id: Uuid::new_v4(),
        origin: "Ayacucho".to_string(),
        destination: "Lima".to_string(),
        company: "Vía Rápida".to_string(),
        departure_time: departure,
        arrival_time_label: "06:30".to_string(),
        duration_label: "9h 30m".to_string(),
        service_tier: ServiceTier::Economy,
        price_amount: 3000,
        price_currency: "PEN".to_string(),
        seats_total,
        seats_available,
        amenities: vec!["WiFi".to_string(), "TV".to_string()],
        active: true,
        image_url: None,
    }
}

fn request_for(trip: &Trip, seats: &[&str]) -> CreateReservationRequest {
    let passengers: Vec<Passenger> = seats
        .iter()
        .enumerate()
        .map(|(i, seat)| Passenger::new("Rosa", "Quispe", &format!("4567891{}", i), seat))
        .collect();
    CreateReservationRequest {
        trip_id: trip.id,
        passengers,
        price_amount: trip.price_amount,
        currency: trip.price_currency.clone(),
        payment_method: PaymentMethod::Yape,
        trip: TripSnapshot {
            origin: trip.origin.clone(),
            destination: trip.destination.clone(),
            company: trip.company.clone(),
            departure_time: trip.departure_time,
        },
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    service: ReservationService,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let occupancy = Arc::new(SeatOccupancy::new(store.clone() as Arc<dyn ReservationStore>));
    let service = ReservationService::new(
        store.clone() as Arc<dyn ReservationStore>,
        occupancy,
        BookingRules::default(),
    );
    Fixture { store, service }
}

/// seats_total - seats_available must equal the passengers held by active
/// reservations, whenever no operation is in flight
async fn assert_conservation(store: &Arc<MemoryStore>, trip_id: Uuid) {
    let trip = store.get_trip(trip_id).await.unwrap().unwrap();
    let active: i32 = store
        .list_active_for_trip(trip_id)
        .await
        .unwrap()
        .iter()
        .map(|r| r.passenger_count)
        .sum();
    assert_eq!(trip.seats_total - trip.seats_available, active);
}

#[tokio::test]
async fn test_booking_decrements_and_occupies() {
    let f = fixture();
    let trip = make_trip(Utc::now() + Duration::days(3), 40, 40);
    f.store.insert_trip(&trip).await.unwrap();
    let identity = FixedIdentity::user("user-1");

    let reservation = f
        .service
        .create(&identity, request_for(&trip, &["1A", "1B"]))
        .await
        .unwrap();

    assert_eq!(reservation.passenger_count, 2);
    assert_eq!(reservation.total_amount, 6000);

    let stored = f.store.get_trip(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.seats_available, 38);

    let occupancy = SeatOccupancy::new(f.store.clone() as Arc<dyn ReservationStore>);
    let occupied = occupancy.occupied_seats(trip.id).await.unwrap();
    assert_eq!(occupied.len(), 2);
    assert!(occupied.contains("1A"));
    assert!(occupied.contains("1B"));
    assert!(occupancy.is_seat_occupied(trip.id, "1A").await.unwrap());
    assert!(!occupancy.is_seat_occupied(trip.id, "2A").await.unwrap());

    assert_conservation(&f.store, trip.id).await;
}

#[tokio::test]
async fn test_taken_seat_is_rejected_for_other_users() {
    let f = fixture();
    let trip = make_trip(Utc::now() + Duration::days(3), 40, 40);
    f.store.insert_trip(&trip).await.unwrap();

    f.service
        .create(&FixedIdentity::user("user-1"), request_for(&trip, &["1A", "1B"]))
        .await
        .unwrap();

    let err = f
        .service
        .create(&FixedIdentity::user("user-2"), request_for(&trip, &["1A"]))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SeatUnavailable { seat } if seat == "1A"));

    // The failed attempt must not change the counter
    let stored = f.store.get_trip(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.seats_available, 38);
    assert_conservation(&f.store, trip.id).await;
}

#[tokio::test]
async fn test_seat_uniqueness_over_many_bookings() {
    let f = fixture();
    let trip = make_trip(Utc::now() + Duration::days(3), 40, 40);
    f.store.insert_trip(&trip).await.unwrap();

    let seats = [["1A", "1B"], ["1C", "1D"], ["2A", "2B"], ["2C", "2D"]];
    for (i, pair) in seats.iter().enumerate() {
        f.service
            .create(
                &FixedIdentity::user(&format!("user-{}", i)),
                request_for(&trip, pair),
            )
            .await
            .unwrap();
    }

    let occupancy = SeatOccupancy::new(f.store.clone() as Arc<dyn ReservationStore>);
    let occupied = occupancy.occupied_seats(trip.id).await.unwrap();
    // A set with no duplicates: 8 distinct seats from 8 passengers
    assert_eq!(occupied.len(), 8);
    assert_conservation(&f.store, trip.id).await;
}

#[tokio::test]
async fn test_validation_order_and_variants() {
    let f = fixture();
    let trip = make_trip(Utc::now() + Duration::days(3), 40, 40);
    f.store.insert_trip(&trip).await.unwrap();
    let identity = FixedIdentity::user("user-1");

    // Empty party
    let err = f
        .service
        .create(&identity, request_for(&trip, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidPassengerCount { max: 5 }));

    // Too many passengers
    let err = f
        .service
        .create(
            &identity,
            request_for(&trip, &["1A", "1B", "1C", "1D", "2A", "2B"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::InvalidPassengerCount { .. }));

    // Bad passenger data points at the offender
    let mut req = request_for(&trip, &["1A", "1B"]);
    req.passengers[1].document_id = "123".to_string();
    let err = f.service.create(&identity, req).await.unwrap_err();
    match err {
        BookingError::InvalidPassengerData { index, source } => {
            assert_eq!(index, 1);
            assert_eq!(source.field, "document_id");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // The same seat twice in one request
    let err = f
        .service
        .create(&identity, request_for(&trip, &["3A", "3A"]))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::DuplicateSeatInRequest { seat } if seat == "3A"));

    // Zero price
    let mut req = request_for(&trip, &["1A"]);
    req.price_amount = 0;
    let err = f.service.create(&identity, req).await.unwrap_err();
    assert!(matches!(err, BookingError::InvalidPrice));

    // No identity
    let err = f
        .service
        .create(&FixedIdentity::anonymous(), request_for(&trip, &["1A"]))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Unauthenticated));

    // Nothing was written along the way
    let stored = f.store.get_trip(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.seats_available, 40);
}

#[tokio::test]
async fn test_find_by_code_round_trip() {
    let f = fixture();
    let trip = make_trip(Utc::now() + Duration::days(3), 40, 40);
    f.store.insert_trip(&trip).await.unwrap();

    let created = f
        .service
        .create(&FixedIdentity::user("user-1"), request_for(&trip, &["5C"]))
        .await
        .unwrap();

    let found = f.service.find_by_code(&created.code).await.unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.code, created.code);
    assert_eq!(found.passengers, created.passengers);
    assert_eq!(found.total_amount, created.total_amount);
    assert_eq!(found.trip, created.trip);

    let err = f.service.find_by_code("VR000000XXXX").await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound));
}

#[tokio::test]
async fn test_cancellation_window() {
    let f = fixture();

    // Comfortably inside the window: cancel succeeds and returns the seats
    let trip = make_trip(Utc::now() + Duration::hours(24) + Duration::minutes(5), 40, 40);
    f.store.insert_trip(&trip).await.unwrap();
    let reservation = f
        .service
        .create(&FixedIdentity::user("user-1"), request_for(&trip, &["1A", "1B"]))
        .await
        .unwrap();

    f.service.cancel(reservation.id).await.unwrap();
    let stored = f.store.get_trip(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.seats_available, 40);
    assert_conservation(&f.store, trip.id).await;

    // One hour under the cutoff: rejected, nothing changes
    let late_trip = make_trip(Utc::now() + Duration::hours(23) + Duration::minutes(30), 40, 40);
    f.store.insert_trip(&late_trip).await.unwrap();
    let late = f
        .service
        .create(&FixedIdentity::user("user-1"), request_for(&late_trip, &["2A"]))
        .await
        .unwrap();

    let err = f.service.cancel(late.id).await.unwrap_err();
    match err {
        BookingError::CancellationWindowExpired {
            hours_remaining,
            cutoff,
        } => {
            assert_eq!(hours_remaining, 23);
            assert_eq!(cutoff, 24);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    let stored = f.store.get_trip(late_trip.id).await.unwrap().unwrap();
    assert_eq!(stored.seats_available, 39);
}

#[tokio::test]
async fn test_cancel_twice_never_double_increments() {
    let f = fixture();
    let trip = make_trip(Utc::now() + Duration::days(3), 40, 40);
    f.store.insert_trip(&trip).await.unwrap();

    let reservation = f
        .service
        .create(&FixedIdentity::user("user-1"), request_for(&trip, &["1A", "1B"]))
        .await
        .unwrap();

    f.service.cancel(reservation.id).await.unwrap();
    let err = f.service.cancel(reservation.id).await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound));

    let stored = f.store.get_trip(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.seats_available, 40);

    let err = f.service.cancel(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound));
}

#[tokio::test]
async fn test_concurrent_bookers_for_last_seat() {
    let f = fixture();
    let trip = make_trip(Utc::now() + Duration::days(3), 40, 1);
    f.store.insert_trip(&trip).await.unwrap();

    let id_a = FixedIdentity::user("user-1");
    let id_b = FixedIdentity::user("user-2");
    let a = f
        .service
        .create(&id_a, request_for(&trip, &["10D"]));
    let b = f
        .service
        .create(&id_b, request_for(&trip, &["10C"]));
    let (ra, rb) = tokio::join!(a, b);

    let successes = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let loser = if ra.is_ok() { rb } else { ra };
    assert!(matches!(
        loser.unwrap_err(),
        BookingError::InsufficientSeats {
            requested: 1,
            available: 0
        }
    ));

    let stored = f.store.get_trip(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.seats_available, 0);
    assert_conservation(&f.store, trip.id).await;
}

#[tokio::test]
async fn test_concurrent_bookers_for_same_seat() {
    let f = fixture();
    let trip = make_trip(Utc::now() + Duration::days(3), 40, 40);
    f.store.insert_trip(&trip).await.unwrap();

    let id_a = FixedIdentity::user("user-1");
    let id_b = FixedIdentity::user("user-2");
    let a = f
        .service
        .create(&id_a, request_for(&trip, &["7B"]));
    let b = f
        .service
        .create(&id_b, request_for(&trip, &["7B"]));
    let (ra, rb) = tokio::join!(a, b);

    let successes = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let loser = if ra.is_ok() { rb } else { ra };
    assert!(matches!(
        loser.unwrap_err(),
        BookingError::SeatUnavailable { seat } if seat == "7B"
    ));

    let stored = f.store.get_trip(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.seats_available, 39);
    assert_conservation(&f.store, trip.id).await;
}

#[tokio::test]
async fn test_active_and_history_views() {
    let f = fixture();
    let soon = make_trip(Utc::now() + Duration::days(2), 40, 40);
    let later = make_trip(Utc::now() + Duration::days(10), 40, 40);
    f.store.insert_trip(&soon).await.unwrap();
    f.store.insert_trip(&later).await.unwrap();
    let identity = FixedIdentity::user("user-1");

    // Book the later trip first so ordering is by departure, not creation
    let on_later = f
        .service
        .create(&identity, request_for(&later, &["1A"]))
        .await
        .unwrap();
    let on_soon = f
        .service
        .create(&identity, request_for(&soon, &["1A"]))
        .await
        .unwrap();

    let active = f.service.list_active("user-1").await.unwrap();
    assert_eq!(active.len(), 2);
    assert_eq!(active[0].id, on_soon.id);
    assert_eq!(active[1].id, on_later.id);

    // Someone else sees nothing
    assert!(f.service.list_active("user-2").await.unwrap().is_empty());

    // Cancelling moves a reservation into history
    f.service.cancel(on_later.id).await.unwrap();
    let active = f.service.list_active("user-1").await.unwrap();
    assert_eq!(active.len(), 1);
    let history = f.service.list_history("user-1").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, on_later.id);
}

#[tokio::test]
async fn test_departure_sweep_completes_reservations() {
    let f = fixture();
    // Departs in the past; insert directly since booking a departed trip is
    // not part of the flow
    let departed = make_trip(Utc::now() - Duration::hours(2), 40, 40);
    let upcoming = make_trip(Utc::now() + Duration::days(2), 40, 40);
    f.store.insert_trip(&departed).await.unwrap();
    f.store.insert_trip(&upcoming).await.unwrap();
    let identity = FixedIdentity::user("user-1");

    let past = f
        .service
        .create(&identity, request_for(&departed, &["1A"]))
        .await
        .unwrap();
    f.service
        .create(&identity, request_for(&upcoming, &["1A"]))
        .await
        .unwrap();

    let completed = f.service.complete_departed().await.unwrap();
    assert_eq!(completed, 1);

    let history = f.service.list_history("user-1").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, past.id);

    // Active view keeps only the upcoming trip
    let active = f.service.list_active("user-1").await.unwrap();
    assert_eq!(active.len(), 1);

    // A second sweep finds nothing new
    assert_eq!(f.service.complete_departed().await.unwrap(), 0);
}
