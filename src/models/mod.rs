pub mod blog;
pub mod booking;
pub mod settings;

pub use blog::BlogPost;
pub use booking::{Booking, BookingStatus, PaymentMethod, PendingBooking};
pub use settings::SiteSettings;
