pub mod contact;
pub mod message;

pub use contact::Contact;
pub use message::Message;
