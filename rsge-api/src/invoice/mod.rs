//! eAPI tax invoice and declaration service (REST)

pub mod client;
pub mod enums;
pub mod models;

pub use client::{operation_period, BarCodeFilter, ExciseFilter, InvoiceClient, InvoiceFilter};
pub use enums::{CorrectReason, InvoiceCategory, InvoiceListType, InvoiceType, InvoiceVatType, ReturnType};
pub use models::{
    BarCode, ExciseRecord, Invoice, InvoiceAction, InvoiceAdvance, InvoiceAuthResponse,
    InvoiceGoods, InvoiceReturn, OrgInfo, SubInvoiceDistribution, TransactionResult, Unit,
};
