pub mod fact;

pub use fact::{Fact, FactPatch, Feedback, NewFact};
