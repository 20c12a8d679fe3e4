pub mod entities;

pub use entities::recurring_payment::{
    occurrences, ActiveFlag, Frequency, Occurrences, UnknownFrequency,
};
