//! Typed clients for the Georgian Revenue Service (rs.ge) web services
//!
//! Three independent clients share one error type and one field codec:
//!
//! * [`WayBillClient`] for electronic waybills over SOAP
//!   (`WayBillService.asmx`), authenticated by service user credentials on
//!   every call
//! * [`InvoiceClient`] for tax invoices and VAT declarations over the eAPI
//!   REST service, with one- or two-factor bearer token authentication
//! * [`CustomsClient`] for assessed customs declarations
//!
//! All calls are blocking. Each client owns its HTTP agent and its
//! authentication state, so separate instances never interfere.
//!
//! ```rust,no_run
//! use rsge_api::{DeviceInfo, InvoiceClient};
//! use rsge_api::invoice::{Invoice, InvoiceCategory};
//!
//! let mut client = InvoiceClient::new();
//! let auth = client.authenticate("user", "password", "")?;
//! if auth.needs_pin() {
//!     client.authenticate_pin(&auth.pin_token, "1234", &DeviceInfo::default())?;
//! }
//!
//! let mut invoice = Invoice {
//!     inv_category: InvoiceCategory::GoodsService.into(),
//!     tin_buyer: "206322102".to_string(),
//!     ..Invoice::default()
//! };
//! invoice.add_goods("მაცივარი", 1.0, 1200.0);
//!
//! let transaction = client.save_invoice(&invoice, "")?;
//! let result = client.get_transaction_result(&transaction)?;
//! client.sign_out();
//! # Ok::<(), rsge_api::RsgeError>(())
//! ```
//!
//! Nothing is logged unless the application installs a subscriber; see
//! [`logging`].

pub mod codec;
pub mod config;
pub mod customs;
pub mod error;
pub mod invoice;
pub mod logging;
pub mod rest;
pub mod waybill;

pub use codec::{Code, WireCode};
pub use config::ClientConfig;
pub use customs::CustomsClient;
pub use error::{Result, RsgeError};
pub use invoice::InvoiceClient;
pub use rest::{AuthState, DeviceInfo};
pub use waybill::WayBillClient;
