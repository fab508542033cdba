pub mod bulk_loader;
mod observations;
mod units;
pub mod weather_data;

pub use bulk_loader::{BulkFile, BulkLoader, CachePolicy, MeteostatConfig};
pub use observations::{condition_code, DailyObservation, HourlyObservation};
pub use units::Units;
pub use weather_data::{Frequency, MeteostatAccess, StationRequest, WeatherData};
