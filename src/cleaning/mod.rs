pub mod controls;
pub mod filter;
pub mod outcomes;
pub mod pipeline;
pub mod reshape;

pub use controls::{assigned_topics, label_manipulation_check};
pub use filter::filter_participants;
pub use outcomes::derive_outcomes;
pub use pipeline::{clean_survey, CleaningSummary, ColumnGroups};
pub use reshape::{clean_responses, CleanedResponses};
