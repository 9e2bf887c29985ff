pub mod calendar;
pub mod class;
pub mod contact;
pub mod overview;
pub mod profile;
pub mod registration;
pub mod shop;
