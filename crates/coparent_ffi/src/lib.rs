//! Flutter bridge surface for the custody core.

pub mod api;
