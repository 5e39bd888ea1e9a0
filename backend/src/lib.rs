//! Email-keyed accounts over an identifier-keyed account store.

pub mod domain;
pub mod outbound;
pub mod settings;
