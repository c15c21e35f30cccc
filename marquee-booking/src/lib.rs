pub mod policy;
pub mod pricing;
pub mod service;

pub use policy::ReservationPolicy;
pub use pricing::PriceResolver;
pub use service::{ReservationService, SeatMapRow, SeatMapSeat, SeatMapView};
