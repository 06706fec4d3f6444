//! Rules shared by the companion API component and the companion client.
//!
//! Nothing in here performs I/O: the server agents and the client both call
//! into these functions so that validation and counting behave the same on
//! either side of the wire.

pub mod api;
pub mod likes;
pub mod rides;
pub mod validation;
