pub mod availability;
pub mod booking;
pub mod cancellation;
pub mod history;
pub mod layout;
pub mod payment;
