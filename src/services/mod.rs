pub mod checkout;
pub mod mail;
pub mod notifications;
pub mod payments;
pub mod settings;
