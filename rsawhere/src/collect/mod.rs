pub mod awhere;
pub mod global_variables;
