//! Reusable drawing helpers.

pub mod status_card;
