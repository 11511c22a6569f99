//! Waybill service records and their XML form
//!
//! Tag names are the service's own, misspellings included
//! (`TRANSPORT_COAST`, `SELER_UN_ID`, `CHEK_BUYER_TIN`).

use soap_client::SoapParams;
use xmltree::Element;

use super::enums::{
    CategoryType, ConfirmationStatus, TransportCostPayer, VatType, WayBillStatus, WayBillType,
};
use crate::codec::xml::{self, FromXml, ToXml};
use crate::codec::{round2, Code};

/// Goods line status: counted in totals
pub const GOODS_ACTIVE: i64 = 1;
/// Goods line status: tombstone asking the service to delete the line
pub const GOODS_DELETED: i64 = -1;

/// A registered service user account
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceUser {
    pub id: i64,
    pub user_name: String,
    /// Taxpayer unique number
    pub un_id: i64,
    /// Whitelisted IP address
    pub ip: String,
    /// Object or store name
    pub name: String,
}

impl FromXml for ServiceUser {
    fn from_xml(el: &Element) -> Self {
        Self {
            id: xml::int(el, "ID", 0),
            user_name: xml::text(el, "USER_NAME"),
            un_id: xml::int(el, "UN_ID", 0),
            ip: xml::text(el, "IP"),
            name: xml::text(el, "NAME"),
        }
    }
}

/// Excise (akciz) commodity code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AkcizCode {
    pub id: i64,
    pub title: String,
    pub measurement: String,
    pub commodity_code: String,
    pub rate: f64,
}

impl FromXml for AkcizCode {
    fn from_xml(el: &Element) -> Self {
        Self {
            id: xml::int(el, "ID", 0),
            title: xml::text(el, "TITLE"),
            measurement: xml::text(el, "MEASUREMENT"),
            commodity_code: xml::text(el, "SAKON_KODI"),
            rate: xml::decimal(el, "AKCIS_GANAKV", 0.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WayBillTypeInfo {
    pub id: i64,
    pub name: String,
}

impl FromXml for WayBillTypeInfo {
    fn from_xml(el: &Element) -> Self {
        Self {
            id: xml::int(el, "ID", 0),
            name: xml::text(el, "NAME"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WayBillUnit {
    pub id: i64,
    pub name: String,
}

impl FromXml for WayBillUnit {
    fn from_xml(el: &Element) -> Self {
        Self {
            id: xml::int(el, "ID", 0),
            name: xml::text(el, "NAME"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportType {
    pub id: i64,
    pub name: String,
}

impl FromXml for TransportType {
    fn from_xml(el: &Element) -> Self {
        Self {
            id: xml::int(el, "ID", 0),
            name: xml::text(el, "NAME"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WoodType {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl FromXml for WoodType {
    fn from_xml(el: &Element) -> Self {
        Self {
            id: xml::int(el, "ID", 0),
            name: xml::text(el, "NAME"),
            description: xml::text(el, "DESCRIPTION"),
        }
    }
}

/// Error code reference entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorCode {
    /// Negative service code
    pub id: i64,
    pub text: String,
    /// 1 waybill, 2 goods line, 3 invoice
    pub error_type: i64,
}

impl FromXml for ErrorCode {
    fn from_xml(el: &Element) -> Self {
        Self {
            id: xml::int(el, "ID", 0),
            text: xml::text(el, "TEXT"),
            error_type: xml::int(el, "TYPE", 0),
        }
    }
}

/// Saved waybill template reference
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WayBillTemplate {
    pub id: i64,
    pub name: String,
}

impl FromXml for WayBillTemplate {
    fn from_xml(el: &Element) -> Self {
        Self {
            id: xml::int(el, "ID", 0),
            name: xml::text(el, "NAME"),
        }
    }
}

/// Entry of the personal barcode catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarCode {
    pub bar_code: String,
    pub goods_name: String,
    pub unit_id: i64,
    pub unit_txt: String,
    pub akciz_id: i64,
}

impl FromXml for BarCode {
    fn from_xml(el: &Element) -> Self {
        Self {
            bar_code: xml::text(el, "bar_code"),
            goods_name: xml::text(el, "goods_name"),
            unit_id: xml::int(el, "unit_id", 0),
            unit_txt: xml::text(el, "unit_txt"),
            akciz_id: xml::int(el, "a_id", 0),
        }
    }
}

/// One goods line of a waybill
#[derive(Debug, Clone, PartialEq)]
pub struct GoodsItem {
    /// 0 for a new line
    pub id: i64,
    pub name: String,
    pub unit_id: i64,
    /// Required when `unit_id` is 99 ("other")
    pub unit_txt: String,
    pub quantity: f64,
    pub price: f64,
    /// [`GOODS_ACTIVE`] or [`GOODS_DELETED`]
    pub status: i64,
    pub amount: f64,
    /// Barcode, or registration number for medicine
    pub bar_code: String,
    pub akciz_id: i64,
    pub vat_type: Code<VatType>,
    pub quantity_ext: f64,
    pub wood_label: String,
    pub wood_type_id: i64,
}

impl Default for GoodsItem {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            unit_id: 1,
            unit_txt: String::new(),
            quantity: 0.0,
            price: 0.0,
            status: GOODS_ACTIVE,
            amount: 0.0,
            bar_code: String::new(),
            akciz_id: 0,
            vat_type: Code::Known(VatType::Regular),
            quantity_ext: 0.0,
            wood_label: String::new(),
            wood_type_id: 0,
        }
    }
}

impl GoodsItem {
    /// New active line with `amount = round2(quantity * price)`
    pub fn new(name: &str, unit_id: i64, quantity: f64, price: f64, bar_code: &str) -> Self {
        Self {
            name: name.to_string(),
            unit_id,
            quantity,
            price,
            amount: round2(quantity * price),
            bar_code: bar_code.to_string(),
            ..Self::default()
        }
    }

    pub fn with_unit_txt(mut self, unit_txt: &str) -> Self {
        self.unit_txt = unit_txt.to_string();
        self
    }

    pub fn with_akciz_id(mut self, akciz_id: i64) -> Self {
        self.akciz_id = akciz_id;
        self
    }

    pub fn with_vat_type(mut self, vat_type: VatType) -> Self {
        self.vat_type = Code::Known(vat_type);
        self
    }

    pub fn with_quantity_ext(mut self, quantity_ext: f64) -> Self {
        self.quantity_ext = quantity_ext;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == GOODS_ACTIVE
    }

    /// Turn the line into a deletion tombstone for the next save
    pub fn mark_deleted(&mut self) {
        self.status = GOODS_DELETED;
    }
}

impl ToXml for GoodsItem {
    fn to_xml(&self) -> Element {
        let mut goods = Element::new("GOODS");
        xml::push(&mut goods, "ID", self.id);
        xml::push(&mut goods, "W_NAME", &self.name);
        xml::push(&mut goods, "UNIT_ID", self.unit_id);
        xml::push(&mut goods, "UNIT_TXT", &self.unit_txt);
        xml::push_decimal(&mut goods, "QUANTITY", self.quantity);
        xml::push_decimal(&mut goods, "PRICE", self.price);
        xml::push(&mut goods, "STATUS", self.status);
        xml::push_decimal(&mut goods, "AMOUNT", self.amount);
        xml::push(&mut goods, "BAR_CODE", &self.bar_code);
        xml::push(&mut goods, "A_ID", self.akciz_id);
        xml::push(&mut goods, "VAT_TYPE", self.vat_type);
        xml::push_decimal(&mut goods, "QUANTITY_EXT", self.quantity_ext);
        xml::push(&mut goods, "WOOD_LABEL", &self.wood_label);
        xml::push(&mut goods, "W_ID", self.wood_type_id);
        goods
    }
}

impl FromXml for GoodsItem {
    fn from_xml(el: &Element) -> Self {
        Self {
            id: xml::int(el, "ID", 0),
            name: xml::text(el, "W_NAME"),
            unit_id: xml::int(el, "UNIT_ID", 0),
            unit_txt: xml::text(el, "UNIT_TXT"),
            quantity: xml::decimal(el, "QUANTITY", 0.0),
            price: xml::decimal(el, "PRICE", 0.0),
            status: xml::int(el, "STATUS", GOODS_ACTIVE),
            amount: xml::decimal(el, "AMOUNT", 0.0),
            bar_code: xml::text(el, "BAR_CODE"),
            akciz_id: xml::int(el, "A_ID", 0),
            vat_type: Code::from_wire(xml::int(el, "VAT_TYPE", 0)),
            quantity_ext: xml::decimal(el, "QUANTITY_EXT", 0.0),
            wood_label: xml::text(el, "WOOD_LABEL"),
            wood_type_id: xml::int(el, "W_ID", 0),
        }
    }
}

/// Timber origin document attached to a wood-category waybill
#[derive(Debug, Clone, PartialEq)]
pub struct WoodDocument {
    pub id: i64,
    pub doc_number: String,
    /// `YYYY-MM-DDTHH:MM:SS`; omitted from the request when unset
    pub doc_date: Option<String>,
    pub doc_description: String,
    pub status: i64,
}

impl Default for WoodDocument {
    fn default() -> Self {
        Self {
            id: 0,
            doc_number: String::new(),
            doc_date: None,
            doc_description: String::new(),
            status: GOODS_ACTIVE,
        }
    }
}

impl ToXml for WoodDocument {
    fn to_xml(&self) -> Element {
        let mut doc = Element::new("WOODDOCUMENT");
        xml::push(&mut doc, "ID", self.id);
        xml::push(&mut doc, "DOC_N", &self.doc_number);
        if let Some(date) = &self.doc_date {
            xml::push(&mut doc, "DOC_DATE", date);
        }
        xml::push(&mut doc, "DOC_DESC", &self.doc_description);
        xml::push(&mut doc, "STATUS", self.status);
        doc
    }
}

impl FromXml for WoodDocument {
    fn from_xml(el: &Element) -> Self {
        let date = xml::text(el, "DOC_DATE");
        Self {
            id: xml::int(el, "ID", 0),
            doc_number: xml::text(el, "DOC_N"),
            doc_date: (!date.is_empty()).then_some(date),
            doc_description: xml::text(el, "DOC_DESC"),
            status: xml::int(el, "STATUS", GOODS_ACTIVE),
        }
    }
}

/// Reference to a sub-waybill under a distribution waybill
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubWayBill {
    pub id: i64,
    pub waybill_number: String,
}

impl ToXml for SubWayBill {
    fn to_xml(&self) -> Element {
        let mut sub = Element::new("SUB_WAYBILL");
        xml::push(&mut sub, "ID", self.id);
        xml::push(&mut sub, "WAYBILL_NUMBER", &self.waybill_number);
        sub
    }
}

impl FromXml for SubWayBill {
    fn from_xml(el: &Element) -> Self {
        Self {
            id: xml::int(el, "ID", 0),
            waybill_number: xml::text(el, "WAYBILL_NUMBER"),
        }
    }
}

/// Complete electronic waybill
///
/// `full_amount` is kept equal to the rounded sum of the active goods lines
/// by [`WayBill::add_goods`]. The last five fields are set by the service
/// and never written back.
#[derive(Debug, Clone, PartialEq)]
pub struct WayBill {
    pub id: i64,
    pub waybill_type: Code<WayBillType>,
    pub buyer_tin: String,
    /// 1 for a Georgian citizen or company, 0 for a foreign buyer
    pub check_buyer_tin: i64,
    pub buyer_name: String,
    pub start_address: String,
    pub end_address: String,
    pub driver_tin: String,
    pub check_driver_tin: i64,
    pub driver_name: String,
    pub transport_cost: f64,
    pub reception_info: String,
    pub receiver_info: String,
    pub delivery_date: String,
    pub status: Code<WayBillStatus>,
    pub seller_un_id: i64,
    /// Parent distribution waybill of a sub-waybill
    pub parent_id: String,
    pub full_amount: f64,
    pub car_number: String,
    pub waybill_number: String,
    pub s_user_id: i64,
    pub begin_date: String,
    pub transport_cost_payer: Code<TransportCostPayer>,
    pub transport_type_id: i64,
    /// Free text when the transport type is "other"
    pub transport_type_txt: String,
    pub comment: String,
    pub category: Code<CategoryType>,
    pub is_medicine: i64,
    pub wood_labels: String,
    /// Transport company of a forwarded waybill
    pub transporter_tin: String,
    pub goods_list: Vec<GoodsItem>,
    pub wood_docs_list: Vec<WoodDocument>,
    pub sub_waybills: Vec<SubWayBill>,
    pub create_date: String,
    pub activate_date: String,
    pub close_date: String,
    pub customs_status: String,
    pub customs_name: String,
}

impl Default for WayBill {
    fn default() -> Self {
        Self {
            id: 0,
            waybill_type: Code::Known(WayBillType::Transportation),
            buyer_tin: String::new(),
            check_buyer_tin: 1,
            buyer_name: String::new(),
            start_address: String::new(),
            end_address: String::new(),
            driver_tin: String::new(),
            check_driver_tin: 1,
            driver_name: String::new(),
            transport_cost: 0.0,
            reception_info: String::new(),
            receiver_info: String::new(),
            delivery_date: String::new(),
            status: Code::Known(WayBillStatus::Saved),
            seller_un_id: 0,
            parent_id: String::new(),
            full_amount: 0.0,
            car_number: String::new(),
            waybill_number: String::new(),
            s_user_id: 0,
            begin_date: String::new(),
            transport_cost_payer: Code::Known(TransportCostPayer::Seller),
            transport_type_id: 1,
            transport_type_txt: String::new(),
            comment: String::new(),
            category: Code::Known(CategoryType::Regular),
            is_medicine: 0,
            wood_labels: String::new(),
            transporter_tin: String::new(),
            goods_list: Vec::new(),
            wood_docs_list: Vec::new(),
            sub_waybills: Vec::new(),
            create_date: String::new(),
            activate_date: String::new(),
            close_date: String::new(),
            customs_status: String::new(),
            customs_name: String::new(),
        }
    }
}

impl WayBill {
    /// Append a goods line and recompute `full_amount`
    pub fn add_goods(&mut self, item: GoodsItem) -> &mut GoodsItem {
        self.goods_list.push(item);
        self.recalculate_total();
        let last = self.goods_list.len() - 1;
        &mut self.goods_list[last]
    }

    pub fn add_wood_document(
        &mut self,
        doc_number: &str,
        doc_date: &str,
        doc_description: &str,
    ) -> &mut WoodDocument {
        self.wood_docs_list.push(WoodDocument {
            doc_number: doc_number.to_string(),
            doc_date: Some(doc_date.to_string()),
            doc_description: doc_description.to_string(),
            ..WoodDocument::default()
        });
        let last = self.wood_docs_list.len() - 1;
        &mut self.wood_docs_list[last]
    }

    /// `full_amount = round2(sum of active line amounts)`
    pub fn recalculate_total(&mut self) {
        self.full_amount = round2(
            self.goods_list
                .iter()
                .filter(|g| g.is_active())
                .map(|g| g.amount)
                .sum(),
        );
    }
}

impl ToXml for WayBill {
    fn to_xml(&self) -> Element {
        let mut wb = Element::new("WAYBILL");

        let mut subs = Element::new("SUB_WAYBILLS");
        for sub in &self.sub_waybills {
            xml::push_element(&mut subs, sub.to_xml());
        }
        xml::push_element(&mut wb, subs);

        let mut goods = Element::new("GOODS_LIST");
        for item in &self.goods_list {
            xml::push_element(&mut goods, item.to_xml());
        }
        xml::push_element(&mut wb, goods);

        let mut docs = Element::new("WOOD_DOCS_LIST");
        for doc in &self.wood_docs_list {
            xml::push_element(&mut docs, doc.to_xml());
        }
        xml::push_element(&mut wb, docs);

        xml::push(&mut wb, "ID", self.id);
        xml::push(&mut wb, "TYPE", self.waybill_type);
        xml::push(&mut wb, "BUYER_TIN", &self.buyer_tin);
        xml::push(&mut wb, "CHEK_BUYER_TIN", self.check_buyer_tin);
        xml::push(&mut wb, "BUYER_NAME", &self.buyer_name);
        xml::push(&mut wb, "START_ADDRESS", &self.start_address);
        xml::push(&mut wb, "END_ADDRESS", &self.end_address);
        xml::push(&mut wb, "DRIVER_TIN", &self.driver_tin);
        xml::push(&mut wb, "CHEK_DRIVER_TIN", self.check_driver_tin);
        xml::push(&mut wb, "DRIVER_NAME", &self.driver_name);
        xml::push_decimal(&mut wb, "TRANSPORT_COAST", self.transport_cost);
        xml::push(&mut wb, "RECEPTION_INFO", &self.reception_info);
        xml::push(&mut wb, "RECEIVER_INFO", &self.receiver_info);
        xml::push(&mut wb, "DELIVERY_DATE", &self.delivery_date);
        xml::push(&mut wb, "STATUS", self.status);
        xml::push(&mut wb, "SELER_UN_ID", self.seller_un_id);
        xml::push(&mut wb, "PAR_ID", &self.parent_id);
        xml::push_decimal(&mut wb, "FULL_AMOUNT", self.full_amount);
        xml::push(&mut wb, "CAR_NUMBER", &self.car_number);
        xml::push(&mut wb, "WAYBILL_NUMBER", &self.waybill_number);
        xml::push(&mut wb, "S_USER_ID", self.s_user_id);
        xml::push(&mut wb, "BEGIN_DATE", &self.begin_date);
        xml::push(&mut wb, "TRAN_COST_PAYER", self.transport_cost_payer);
        xml::push(&mut wb, "TRANS_ID", self.transport_type_id);
        xml::push(&mut wb, "TRANS_TXT", &self.transport_type_txt);
        xml::push(&mut wb, "COMMENT", &self.comment);
        xml::push(&mut wb, "CATEGORY", self.category);
        xml::push(&mut wb, "IS_MED", self.is_medicine);
        xml::push(&mut wb, "WOOD_LABELS", &self.wood_labels);
        if !self.transporter_tin.is_empty() {
            xml::push(&mut wb, "TRANSPORTER_TIN", &self.transporter_tin);
        }
        wb
    }
}

impl FromXml for WayBill {
    fn from_xml(el: &Element) -> Self {
        Self {
            id: xml::int(el, "ID", 0),
            waybill_type: Code::from_wire(xml::int(el, "TYPE", 0)),
            buyer_tin: xml::text(el, "BUYER_TIN"),
            check_buyer_tin: xml::int(el, "CHEK_BUYER_TIN", 0),
            buyer_name: xml::text(el, "BUYER_NAME"),
            start_address: xml::text(el, "START_ADDRESS"),
            end_address: xml::text(el, "END_ADDRESS"),
            driver_tin: xml::text(el, "DRIVER_TIN"),
            check_driver_tin: xml::int(el, "CHEK_DRIVER_TIN", 0),
            driver_name: xml::text(el, "DRIVER_NAME"),
            transport_cost: xml::decimal(el, "TRANSPORT_COAST", 0.0),
            reception_info: xml::text(el, "RECEPTION_INFO"),
            receiver_info: xml::text(el, "RECEIVER_INFO"),
            delivery_date: xml::text(el, "DELIVERY_DATE"),
            status: Code::from_wire(xml::int(el, "STATUS", 0)),
            seller_un_id: xml::int(el, "SELER_UN_ID", 0),
            parent_id: xml::text(el, "PAR_ID"),
            full_amount: xml::decimal(el, "FULL_AMOUNT", 0.0),
            car_number: xml::text(el, "CAR_NUMBER"),
            waybill_number: xml::text(el, "WAYBILL_NUMBER"),
            s_user_id: xml::int(el, "S_USER_ID", 0),
            begin_date: xml::text(el, "BEGIN_DATE"),
            transport_cost_payer: Code::from_wire(xml::int(el, "TRAN_COST_PAYER", 2)),
            transport_type_id: xml::int(el, "TRANS_ID", 0),
            transport_type_txt: xml::text(el, "TRANS_TXT"),
            comment: xml::text(el, "COMMENT"),
            category: Code::from_wire(xml::int(el, "CATEGORY", 0)),
            is_medicine: xml::int(el, "IS_MED", 0),
            wood_labels: xml::text(el, "WOOD_LABELS"),
            transporter_tin: xml::text(el, "TRANSPORTER_TIN"),
            goods_list: xml::list(el, "GOODS_LIST", "GOODS"),
            wood_docs_list: xml::list(el, "WOOD_DOCS_LIST", "WOODDOCUMENT"),
            sub_waybills: xml::list(el, "SUB_WAYBILLS", "SUB_WAYBILL"),
            create_date: xml::text(el, "CREATE_DATE"),
            activate_date: xml::text(el, "ACTIVATE_DATE"),
            close_date: xml::text(el, "CLOSE_DATE"),
            customs_status: xml::text(el, "CUST_STATUS"),
            customs_name: xml::text(el, "CUST_NAME"),
        }
    }
}

/// Per-line outcome inside a [`WayBillSaveResult`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoodsSaveResult {
    pub id: i64,
    /// Negative error code for a rejected line, 0 otherwise
    pub error: i64,
    pub name: String,
    pub status: i64,
}

impl FromXml for GoodsSaveResult {
    fn from_xml(el: &Element) -> Self {
        Self {
            id: xml::int(el, "ID", 0),
            error: xml::int(el, "ERROR", 0),
            name: xml::text(el, "W_NAME"),
            status: xml::int(el, "STATUS", 0),
        }
    }
}

/// Outcome of `save_waybill`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WayBillSaveResult {
    /// 0 on success, a negative error code otherwise
    pub status: i64,
    pub waybill_id: i64,
    pub goods_results: Vec<GoodsSaveResult>,
}

impl WayBillSaveResult {
    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

impl FromXml for WayBillSaveResult {
    fn from_xml(el: &Element) -> Self {
        Self {
            status: xml::int(el, "STATUS", 0),
            waybill_id: xml::int(el, "ID", 0),
            goods_results: xml::list(el, "GOODS_LIST", "GOODS"),
        }
    }
}

/// Summary row of a waybill list query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WayBillListItem {
    pub id: i64,
    pub waybill_type: Code<WayBillType>,
    pub create_date: String,
    pub buyer_tin: String,
    pub buyer_name: String,
    pub seller_tin: String,
    pub seller_name: String,
    pub start_address: String,
    pub end_address: String,
    pub driver_tin: String,
    pub transport_cost: f64,
    pub reception_info: String,
    pub receiver_info: String,
    pub delivery_date: String,
    pub status: Code<WayBillStatus>,
    pub activate_date: String,
    pub parent_id: String,
    pub full_amount: f64,
    pub car_number: String,
    pub waybill_number: String,
    pub close_date: String,
    pub s_user_id: i64,
    pub begin_date: String,
    pub comment: String,
    pub buyer_status: i64,
    pub seller_status: i64,
    pub is_confirmed: Code<ConfirmationStatus>,
}

impl FromXml for WayBillListItem {
    fn from_xml(el: &Element) -> Self {
        Self {
            id: xml::int(el, "ID", 0),
            waybill_type: Code::from_wire(xml::int(el, "TYPE", 0)),
            create_date: xml::text(el, "CREATE_DATE"),
            buyer_tin: xml::text(el, "BUYER_TIN"),
            buyer_name: xml::text(el, "BUYER_NAME"),
            seller_tin: xml::text(el, "SELLER_TIN"),
            seller_name: xml::text(el, "SELLER_NAME"),
            start_address: xml::text(el, "START_ADDRESS"),
            end_address: xml::text(el, "END_ADDRESS"),
            driver_tin: xml::text(el, "DRIVER_TIN"),
            transport_cost: xml::decimal(el, "TRANSPORT_COAST", 0.0),
            reception_info: xml::text(el, "RECEPTION_INFO"),
            receiver_info: xml::text(el, "RECEIVER_INFO"),
            delivery_date: xml::text(el, "DELIVERY_DATE"),
            status: Code::from_wire(xml::int(el, "STATUS", 0)),
            activate_date: xml::text(el, "ACTIVATE_DATE"),
            parent_id: xml::text(el, "PAR_ID"),
            full_amount: xml::decimal(el, "FULL_AMOUNT", 0.0),
            car_number: xml::text(el, "CAR_NUMBER"),
            waybill_number: xml::text(el, "WAYBILL_NUMBER"),
            close_date: xml::text(el, "CLOSE_DATE"),
            s_user_id: xml::int(el, "S_USER_ID", 0),
            begin_date: xml::text(el, "BEGIN_DATE"),
            comment: xml::text(el, "WAYBILL_COMMENT"),
            buyer_status: xml::int(el, "BUYER_ST", 0),
            seller_status: xml::int(el, "SELLER_ST", 0),
            is_confirmed: Code::from_wire(xml::int(el, "IS_CONFIRMED", 0)),
        }
    }
}

/// Filters shared by the waybill list queries
///
/// Empty strings mean "no filter". Multi-valued filters (`types`, `statuses`,
/// `s_user_ids`) are comma separated lists as the service expects them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WayBillFilter {
    pub types: String,
    /// Buyer TIN on seller-side queries, seller TIN on buyer-side queries
    pub counterparty_tin: String,
    pub statuses: String,
    pub car_number: String,
    pub begin_date_s: String,
    pub begin_date_e: String,
    pub create_date_s: String,
    pub create_date_e: String,
    pub driver_tin: String,
    pub delivery_date_s: String,
    pub delivery_date_e: String,
    pub full_amount: String,
    pub waybill_number: String,
    pub close_date_s: String,
    pub close_date_e: String,
    pub s_user_ids: String,
    pub comment: String,
    /// Only sent by the `_ex` queries
    pub is_confirmed: Code<ConfirmationStatus>,
}

impl WayBillFilter {
    /// Shared parameters in service order, followed by the counterparty TIN
    /// under `tin_param`
    pub(crate) fn to_params(&self, tin_param: &str) -> SoapParams {
        SoapParams::new()
            .param("itypes", &self.types)
            .param("statuses", &self.statuses)
            .param("car_number", &self.car_number)
            .param("begin_date_s", &self.begin_date_s)
            .param("begin_date_e", &self.begin_date_e)
            .param("create_date_s", &self.create_date_s)
            .param("create_date_e", &self.create_date_e)
            .param("driver_tin", &self.driver_tin)
            .param("delivery_date_s", &self.delivery_date_s)
            .param("delivery_date_e", &self.delivery_date_e)
            .param("full_amount", &self.full_amount)
            .param("waybill_number", &self.waybill_number)
            .param("close_date_s", &self.close_date_s)
            .param("close_date_e", &self.close_date_e)
            .param("s_user_ids", &self.s_user_ids)
            .param("comment", &self.comment)
            .param(tin_param, &self.counterparty_tin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_waybill() -> WayBill {
        let mut wb = WayBill {
            buyer_tin: "206322102".to_string(),
            buyer_name: "შპს მყიდველი".to_string(),
            start_address: "თბილისი, რუსთაველის 1".to_string(),
            end_address: "ბათუმი, ჭავჭავაძის 5".to_string(),
            driver_tin: "01001011010".to_string(),
            driver_name: "გიორგი".to_string(),
            car_number: "AA123BB".to_string(),
            ..WayBill::default()
        };
        wb.add_goods(GoodsItem::new("ფქვილი", 2, 500.0, 2.50, "4860001"));
        wb.add_goods(GoodsItem::new("შაქარი", 2, 300.0, 1.80, "4860002"));
        wb
    }

    #[test]
    fn test_add_goods_recomputes_total() {
        let wb = sample_waybill();
        assert_eq!(wb.goods_list.len(), 2);
        assert_eq!(wb.goods_list[0].amount, 1250.0);
        assert_eq!(wb.goods_list[1].amount, 540.0);
        assert_eq!(wb.full_amount, 1790.0);
    }

    #[test]
    fn test_deleted_lines_are_excluded_from_total() {
        let mut wb = sample_waybill();
        wb.goods_list[0].mark_deleted();
        wb.recalculate_total();
        assert_eq!(wb.full_amount, 540.0);
    }

    #[test]
    fn test_waybill_xml_layout() {
        let mut wb = sample_waybill();
        let xml_text = xml::to_string(&wb.to_xml()).unwrap();

        assert!(xml_text.starts_with("<WAYBILL><SUB_WAYBILLS"));
        assert!(xml_text.contains("<TRANSPORT_COAST>0.0</TRANSPORT_COAST>"));
        assert!(xml_text.contains("<SELER_UN_ID>0</SELER_UN_ID>"));
        assert!(xml_text.contains("<TYPE>2</TYPE>"));
        assert!(xml_text.contains("<TRAN_COST_PAYER>2</TRAN_COST_PAYER>"));
        assert!(xml_text.contains("<FULL_AMOUNT>1790.0</FULL_AMOUNT>"));
        assert!(!xml_text.contains("TRANSPORTER_TIN"));

        wb.transporter_tin = "404040404".to_string();
        let xml_text = xml::to_string(&wb.to_xml()).unwrap();
        assert!(xml_text.contains("<TRANSPORTER_TIN>404040404</TRANSPORTER_TIN>"));
    }

    #[test]
    fn test_waybill_round_trip_preserves_writable_fields() {
        let mut wb = sample_waybill();
        wb.category = Code::Known(CategoryType::Wood);
        wb.add_wood_document("WD-1", "2024-03-01T00:00:00", "წარმოშობის ცნობა");
        wb.sub_waybills.push(SubWayBill { id: 7, waybill_number: "0999".to_string() });

        let parsed = WayBill::from_xml(&xml::parse(&xml::to_string(&wb.to_xml()).unwrap()).unwrap());

        assert_eq!(parsed, wb);
    }

    #[test]
    fn test_wood_document_date_is_optional() {
        let doc = WoodDocument {
            doc_number: "12".to_string(),
            ..WoodDocument::default()
        };
        let xml_text = xml::to_string(&doc.to_xml()).unwrap();
        assert!(!xml_text.contains("DOC_DATE"));
        assert_eq!(WoodDocument::from_xml(&doc.to_xml()).doc_date, None);
    }

    #[test]
    fn test_from_xml_with_missing_and_malformed_fields() {
        let el = xml::parse(
            "<WAYBILL><ID>abc</ID><STATUS>15</STATUS><FULL_AMOUNT></FULL_AMOUNT></WAYBILL>",
        )
        .unwrap();
        let wb = WayBill::from_xml(&el);

        assert_eq!(wb.id, 0);
        assert_eq!(wb.status, Code::Raw(15));
        assert_eq!(wb.full_amount, 0.0);
        assert_eq!(wb.buyer_name, "");
        assert_eq!(wb.transport_cost_payer, Code::Known(TransportCostPayer::Seller));
        assert!(wb.goods_list.is_empty());
    }

    #[test]
    fn test_save_result_parsing() {
        let el = xml::parse(
            r#"<RESULT>
                 <STATUS>0</STATUS>
                 <ID>912345</ID>
                 <GOODS_LIST>
                   <GOODS><ID>1001</ID><ERROR>0</ERROR><W_NAME>ფქვილი</W_NAME><STATUS>1</STATUS></GOODS>
                   <GOODS><ID>0</ID><ERROR>-3012</ERROR><W_NAME>შაქარი</W_NAME></GOODS>
                 </GOODS_LIST>
               </RESULT>"#,
        )
        .unwrap();
        let result = WayBillSaveResult::from_xml(&el);

        assert!(result.is_success());
        assert_eq!(result.waybill_id, 912345);
        assert_eq!(result.goods_results.len(), 2);
        assert_eq!(result.goods_results[1].error, -3012);
        assert_eq!(result.goods_results[1].status, 0);
    }

    #[test]
    fn test_filter_parameter_order() {
        let filter = WayBillFilter {
            statuses: "1,2".to_string(),
            counterparty_tin: "206322102".to_string(),
            ..WayBillFilter::default()
        };
        let envelope = soap_client::build_envelope("get_waybills", &filter.to_params("buyer_tin"));

        let itypes = envelope.find("<itypes").unwrap();
        let comment = envelope.find("<comment").unwrap();
        let buyer = envelope.find("<buyer_tin>206322102</buyer_tin>").unwrap();
        assert!(itypes < comment && comment < buyer);
        assert!(envelope.contains("<statuses>1,2</statuses>"));
    }

    proptest! {
        #[test]
        fn goods_amount_is_rounded_product(q in 0.0f64..100_000.0, p in 0.0f64..10_000.0) {
            let item = GoodsItem::new("x", 1, q, p, "");
            prop_assert_eq!(item.amount, round2(q * p));
        }

        #[test]
        fn full_amount_tracks_active_lines(
            lines in prop::collection::vec((0.0f64..1_000.0, 0.0f64..100.0, any::<bool>()), 0..12)
        ) {
            let mut wb = WayBill::default();
            for (q, p, deleted) in lines {
                let mut item = GoodsItem::new("x", 1, q, p, "");
                if deleted {
                    item.mark_deleted();
                }
                wb.add_goods(item);

                let expected = round2(
                    wb.goods_list.iter().filter(|g| g.status == GOODS_ACTIVE).map(|g| g.amount).sum(),
                );
                prop_assert_eq!(wb.full_amount, expected);
            }
        }
    }
}
