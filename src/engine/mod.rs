//! Core engine — reconciliation gate and snapshot controller.

pub mod gate;
pub mod controller;
