//! Numeric codes used by the waybill service

use crate::wire_enum;

wire_enum! {
    /// Kind of electronic waybill
    pub enum WayBillType {
        /// Transfer between units of the same taxpayer
        InnerTransport = 1,
        Transportation = 2,
        WithoutTransportation = 3,
        /// Parent document with sub-waybills per stop
        Distribution = 4,
        Return = 5,
        SubWaybill = 6,
    }
}

wire_enum! {
    /// Lifecycle status of a waybill
    pub enum WayBillStatus {
        Saved = 0,
        /// Activated, transport has started
        Active = 1,
        Completed = 2,
        SentToTransporter = 8,
        Deleted = -1,
        Cancelled = -2,
    }
}

wire_enum! {
    pub enum TransportationType {
        Truck = 1,
        Vehicle = 2,
        Railway = 3,
        /// Requires `TRANS_TXT`
        Other = 4,
    }
}

wire_enum! {
    /// VAT treatment of a goods line
    pub enum VatType {
        Regular = 0,
        ZeroRate = 1,
        Exempt = 2,
    }
}

wire_enum! {
    pub enum CategoryType {
        Regular = 0,
        /// Timber; needs wood documents and labels
        Wood = 1,
    }
}

wire_enum! {
    pub enum TransportCostPayer {
        Buyer = 1,
        Seller = 2,
    }
}

wire_enum! {
    /// Buyer confirmation filter for the extended list queries
    pub enum ConfirmationStatus {
        Unconfirmed = 0,
        Confirmed = 1,
        Rejected = -1,
    }
}

wire_enum! {
    pub enum BusinessStatus {
        NoStatus = 0,
        Micro = 1,
        Small = 2,
    }
}

wire_enum! {
    pub enum CustomsConfirmStatus {
        Confirmed = 1,
        Rejected = 2,
    }
}
