mod email_address;
mod new_booking;
mod new_contact;

pub use email_address::EmailAddress;
pub use new_booking::NewBooking;
pub use new_contact::NewContact;
