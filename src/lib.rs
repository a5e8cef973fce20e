//! Appointment and patient backend for a dental clinic.
//!
//! The HTTP surface lives in [`routes`], persistence behind the
//! [`store::ClinicStore`] trait, and the cyclic appointment status in
//! [`status`]. [`client::ClinicClient`] is the typed façade the front-ends
//! talk through.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod status;
pub mod store;
pub mod validation;
