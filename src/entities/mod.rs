pub mod prelude;

pub mod link_identifier;
pub mod rsvp;
pub mod sea_orm_active_enums;
