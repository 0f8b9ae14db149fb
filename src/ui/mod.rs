pub mod panels;
pub mod plot;
pub mod snapshot;
pub mod table;
