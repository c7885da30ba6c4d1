pub mod missile;
