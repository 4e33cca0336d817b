//! Command handlers.

pub(crate) mod import;
