pub use super::link_identifier::Entity as LinkIdentifier;
pub use super::rsvp::Entity as Rsvp;
