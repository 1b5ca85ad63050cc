pub mod csv_file;
pub mod mock;
pub mod price_provider;
pub mod yahoo;
