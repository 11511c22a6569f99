//! Numeric codes used by the eAPI invoice service

use crate::wire_enum;

wire_enum! {
    pub enum InvoiceCategory {
        /// Goods or service delivery
        GoodsService = 1,
        Wood = 2,
        Petroleum = 3,
        Advance = 4,
    }
}

wire_enum! {
    pub enum InvoiceType {
        InnerTransport = 1,
        WithTransport = 2,
        WithoutTransport = 3,
        Distribution = 4,
        Return = 5,
        Advance = 6,
        Retail = 7,
        Wholesale = 8,
        /// Import, transport up to the customs warehouse
        ImportTransport = 9,
        /// Export, transport from the customs warehouse
        ExportTransport = 10,
        Service = 11,
    }
}

wire_enum! {
    pub enum InvoiceVatType {
        Standard = 0,
        ZeroRate = 1,
        Exempt = 2,
    }
}

wire_enum! {
    /// Which document set `list_invoices` returns
    ///
    /// The two-digit codes select the documents that can be bound to a
    /// VAT declaration.
    pub enum InvoiceListType {
        SellerDocs = 1,
        SellerDecl = 10,
        BuyerDocs = 2,
        BuyerDecl = 20,
        /// Documents addressed to you as transporter
        SentToDecl = 21,
        Templates = 3,
        TemplatesDecl = 30,
        AdvanceWithBalance = 5,
        AdvanceBalanceDecl = 50,
    }
}

wire_enum! {
    /// Reason code on a corrective invoice
    pub enum CorrectReason {
        NoCorrection = 0,
        WrongAmount = 1,
        WrongGoods = 2,
        WrongTin = 3,
        WrongDate = 4,
        WrongAddress = 5,
        Other = 6,
    }
}

wire_enum! {
    pub enum ReturnType {
        Partial = 0,
        Full = 1,
    }
}
