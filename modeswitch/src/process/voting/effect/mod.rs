use super::*;

pub mod handle_vote_request;
pub mod register_vote;
