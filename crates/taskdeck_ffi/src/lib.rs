//! Flutter bridge surface for TaskDeck core.

pub mod api;
