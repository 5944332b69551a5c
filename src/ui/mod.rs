//! egui rendering of [`crate::state::AppState`].

pub mod charts;
pub mod panels;
pub mod table;
