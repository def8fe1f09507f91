//! Domain operations over invitation links and RSVPs. Handlers in
//! `crate::routes` translate HTTP to these calls and back.

pub mod links;
pub mod rsvps;
