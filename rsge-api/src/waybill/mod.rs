//! Electronic waybill service (SOAP)
//!
//! [`WayBillClient`] wraps `WayBillService.asmx`. Records are marshaled to
//! and from the service's XML with [`crate::codec::xml`]; numeric codes are
//! kept as [`crate::Code`] so values added by the service later survive.

pub mod client;
pub mod enums;
pub mod models;

pub use client::{check_error_code, ServiceDate, TransporterDetails, WayBillClient};
pub use enums::{
    BusinessStatus, CategoryType, ConfirmationStatus, CustomsConfirmStatus, TransportCostPayer,
    TransportationType, VatType, WayBillStatus, WayBillType,
};
pub use models::{
    AkcizCode, BarCode, ErrorCode, GoodsItem, GoodsSaveResult, ServiceUser, SubWayBill,
    TransportType, WayBill, WayBillFilter, WayBillListItem, WayBillSaveResult, WayBillTemplate,
    WayBillTypeInfo, WayBillUnit, WoodDocument, WoodType,
};
