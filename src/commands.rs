pub mod inspect;
pub mod rank;
