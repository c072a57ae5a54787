mod client;

pub use client::{EmbyClient, LISTING_FIELDS};
