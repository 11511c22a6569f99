//! Customs declarations service (REST)

pub mod client;
pub mod models;

pub use client::CustomsClient;
pub use models::{CustomsAuthResponse, CustomsDeclaration};
