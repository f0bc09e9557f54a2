pub mod booking;
pub mod payment;
pub mod seat;
pub mod show;

pub use booking::{Booking, BookingDetails, BookingReceipt, BookingStatus, NewBooking};
pub use payment::{NewPayment, Payment, PaymentStatus};
pub use seat::SeatCode;
pub use show::ShowSeating;
