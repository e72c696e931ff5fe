mod customer;
mod reservation;

pub use self::customer::*;
pub use self::reservation::*;
