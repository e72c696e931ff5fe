mod customer;
mod relative_time;
mod reservation;

pub use self::customer::*;
pub use self::relative_time::*;
pub use self::reservation::*;
