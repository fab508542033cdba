pub mod db;
pub mod envelope;
pub mod params;
mod routes;
mod startup;
mod utils;
pub mod validate;

pub use db::*;
pub use envelope::{Envelope, Meta};
pub use routes::*;
pub use startup::*;
pub use utils::*;
