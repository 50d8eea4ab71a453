#[macro_use]
extern crate rust_i18n;

i18n!("locales");

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod model;
pub mod report;
pub mod store;

#[cfg(test)]
pub mod test_utils;

pub fn init_locale() {
    rust_i18n::set_locale("en");
}
