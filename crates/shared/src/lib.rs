//! Domain types shared by the landing page core, its storage backends and the apps.

pub mod domain;
pub mod error;
pub mod form;
pub mod records;
pub mod validate;

pub use validate::is_valid_email;
