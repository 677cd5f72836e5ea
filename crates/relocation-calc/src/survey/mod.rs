//! Glue between questionnaire events and the calculations.

pub mod tasks;
pub mod update;

pub use tasks::{CancellationFlag, DeferredOperations, OperationStatus};
pub use update::{
    operation_name, AddressUpdate, ResultsSectionUpdater, ResultsUpdate, SectionAction,
    RESULTS_SECTION,
};
