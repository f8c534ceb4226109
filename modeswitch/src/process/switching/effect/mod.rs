use super::*;

pub mod cancel_switch;
pub mod complete_switch;
pub mod schedule_switch;
pub mod take_pending;
