pub mod dashboard;
pub mod invoices;
pub mod session;
pub mod settings;
