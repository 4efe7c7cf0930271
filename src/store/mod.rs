//! Local state kept between invocations.

pub mod session;
