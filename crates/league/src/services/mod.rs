pub mod events;
pub mod fair_racing;
pub mod roster;
pub mod sanctions;
pub mod squadrons;
