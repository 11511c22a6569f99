//! eAPI invoice records
//!
//! Every record deserializes leniently: numbers may arrive as strings, any
//! field may be `null` or missing. Serialization writes only the fields the
//! service accepts on input; fields the service computes are marked
//! `skip_serializing`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::enums::{CorrectReason, InvoiceCategory, InvoiceType, InvoiceVatType};
use crate::codec::json::{self, as_decimal, as_int, as_text, path};
use crate::codec::{round2, Code};
use crate::waybill::TransportCostPayer;

/// Response of `/Users/Authenticate` and `/Users/AuthenticatePin`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceAuthResponse {
    pub access_token: String,
    pub pin_token: String,
    /// Phone number the PIN was sent to, partially masked
    pub masked_mobile: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub status_id: i64,
    pub status_text: String,
}

impl InvoiceAuthResponse {
    pub fn from_response(response: &Value) -> Self {
        let data = path(response, &["DATA"]);
        let status = path(response, &["STATUS"]);
        Self {
            access_token: as_text(path(data, &["ACCESS_TOKEN"])),
            pin_token: as_text(path(data, &["PIN_TOKEN"])),
            masked_mobile: as_text(path(data, &["MASKED_MOBILE"])),
            expires_in: as_int(path(data, &["EXPIRES_IN"])).unwrap_or(0),
            status_id: as_int(path(status, &["ID"])).unwrap_or(0),
            status_text: as_text(path(status, &["TEXT"])),
        }
    }

    /// Second factor required: a PIN token came back without an access token
    pub fn needs_pin(&self) -> bool {
        !self.pin_token.is_empty() && self.access_token.is_empty()
    }
}

/// One goods or service line of an invoice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct InvoiceGoods {
    #[serde(deserialize_with = "json::int")]
    pub id: i64,
    #[serde(deserialize_with = "json::int")]
    pub invoice_id: i64,
    #[serde(deserialize_with = "json::text")]
    pub goods_name: String,
    #[serde(deserialize_with = "json::text")]
    pub barcode: String,
    #[serde(deserialize_with = "json::int")]
    pub unit_id: i64,
    /// Required when `unit_id` is 99 ("other")
    #[serde(deserialize_with = "json::text")]
    pub unit_txt: String,
    #[serde(deserialize_with = "json::decimal")]
    pub quantity: f64,
    #[serde(deserialize_with = "json::text")]
    pub quantity_ext: String,
    #[serde(skip_serializing, deserialize_with = "json::decimal")]
    pub quantity_stock: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub unit_price: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub amount: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub vat_amount: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub excise_amount: f64,
    #[serde(deserialize_with = "json::int")]
    pub excise_id: i64,
    pub vat_type: Code<InvoiceVatType>,
    #[serde(deserialize_with = "json::decimal")]
    pub excise_unit_price: f64,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub vat_type_txt: String,
    #[serde(skip_serializing)]
    pub inv_type: Code<InvoiceType>,
    #[serde(skip_serializing)]
    pub inv_category: Code<InvoiceCategory>,
}

/// Reference to the invoice a return document corrects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct InvoiceReturn {
    #[serde(deserialize_with = "json::int")]
    pub return_invoice_id: i64,
    #[serde(skip_serializing, deserialize_with = "json::int")]
    pub corrected_invoice_id: i64,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub inv_number: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub inv_serie: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub buyer: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub operation_date: String,
}

/// Advance payment offset against an invoice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct InvoiceAdvance {
    #[serde(skip_serializing, deserialize_with = "json::int")]
    pub parent_invoice_id: i64,
    #[serde(deserialize_with = "json::int")]
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "json::text")]
    pub operation_date: String,
    #[serde(deserialize_with = "json::decimal")]
    pub amount: f64,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub inv_number: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub inv_serie: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub buyer: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub seller: String,
    #[serde(skip_serializing)]
    pub inv_category: Code<InvoiceCategory>,
    #[serde(skip_serializing)]
    pub inv_type: Code<InvoiceType>,
    #[serde(skip_serializing, deserialize_with = "json::decimal")]
    pub amount_full: f64,
    #[serde(skip_serializing, deserialize_with = "json::decimal")]
    pub amount_max: f64,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub activate_date: String,
}

/// Sub-invoice of a distribution invoice, as reported by the service
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SubInvoiceDistribution {
    #[serde(deserialize_with = "json::int")]
    pub parent_invoice_id: i64,
    #[serde(deserialize_with = "json::int")]
    pub sub_invoice_id: i64,
    #[serde(deserialize_with = "json::text")]
    pub inv_number: String,
    #[serde(deserialize_with = "json::text")]
    pub inv_serie: String,
    #[serde(deserialize_with = "json::text")]
    pub buyer: String,
    #[serde(deserialize_with = "json::text")]
    pub seller: String,
    pub inv_category: Code<InvoiceCategory>,
    pub inv_type: Code<InvoiceType>,
    #[serde(deserialize_with = "json::decimal")]
    pub amount_full: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub goods_amount_sum: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub goods_sum: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub amount_max: f64,
    #[serde(deserialize_with = "json::text")]
    pub activate_date: String,
    #[serde(deserialize_with = "json::text")]
    pub operation_date: String,
}

/// Tax invoice (the eAPI `INVOICE` object)
///
/// Unlike [`crate::waybill::WayBill`], the invoice totals are not derived
/// from the goods lines: [`Invoice::add_goods`] computes the line amount
/// only and `amount_full`, `amount_vat` and `amount_excise` stay whatever
/// the caller sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Invoice {
    #[serde(deserialize_with = "json::int")]
    pub id: i64,
    #[serde(deserialize_with = "json::text")]
    pub inv_serie: String,
    /// Assigned on activation
    #[serde(deserialize_with = "json::text")]
    pub inv_number: String,
    pub inv_category: Code<InvoiceCategory>,
    pub inv_type: Code<InvoiceType>,
    #[serde(deserialize_with = "json::int")]
    pub seller_action: i64,
    #[serde(deserialize_with = "json::int")]
    pub buyer_action: i64,
    #[serde(deserialize_with = "json::text")]
    pub operation_date: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub activate_date: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub create_date: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub confirm_date: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub refuse_date: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub request_cancel_date: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub delivery_date: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub agree_cancel_date: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub correct_date: String,
    #[serde(deserialize_with = "json::text")]
    pub trans_start_date: String,
    pub correct_reason_id: Code<CorrectReason>,
    #[serde(deserialize_with = "json::text")]
    pub tin_seller: String,
    #[serde(deserialize_with = "json::text")]
    pub tin_buyer: String,
    #[serde(serialize_with = "json::flag_text", deserialize_with = "json::flag")]
    pub foreign_buyer: bool,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub name_seller: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub name_buyer: String,
    /// Seller declaration the invoice is bound to
    #[serde(skip_serializing, deserialize_with = "json::opt_int")]
    pub seqnum_seller: Option<i64>,
    #[serde(skip_serializing, deserialize_with = "json::opt_int")]
    pub seqnum_buyer: Option<i64>,
    #[serde(skip_serializing, deserialize_with = "json::int")]
    pub seller_status: i64,
    #[serde(skip_serializing, deserialize_with = "json::int")]
    pub buyer_status: i64,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub status_txt_geo: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub status_txt_eng: String,
    #[serde(deserialize_with = "json::decimal")]
    pub amount_full: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub amount_excise: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub amount_vat: f64,
    #[serde(skip_serializing, deserialize_with = "json::decimal")]
    pub amount_max: f64,
    #[serde(deserialize_with = "json::text")]
    pub trans_start_address: String,
    #[serde(deserialize_with = "json::text")]
    pub trans_end_address: String,
    #[serde(deserialize_with = "json::text")]
    pub trans_start_address_no: String,
    #[serde(deserialize_with = "json::text")]
    pub trans_end_address_no: String,
    #[serde(deserialize_with = "json::int")]
    pub trans_type: i64,
    #[serde(deserialize_with = "json::text")]
    pub trans_type_txt: String,
    #[serde(deserialize_with = "json::text")]
    pub trans_company_tin: String,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub trans_company_name: String,
    #[serde(deserialize_with = "json::text")]
    pub trans_driver_tin: String,
    #[serde(serialize_with = "json::flag_text", deserialize_with = "json::flag")]
    pub trans_driver_foreign: bool,
    #[serde(skip_serializing, deserialize_with = "json::text")]
    pub trans_driver_name: String,
    #[serde(deserialize_with = "json::text")]
    pub trans_driver_country: String,
    #[serde(deserialize_with = "json::text")]
    pub trans_car_model: String,
    #[serde(deserialize_with = "json::text")]
    pub trans_car_no: String,
    #[serde(deserialize_with = "json::text")]
    pub trans_trailer_no: String,
    #[serde(deserialize_with = "json::text")]
    pub trans_cost: String,
    pub trans_cost_payer: Code<TransportCostPayer>,
    #[serde(deserialize_with = "json::text")]
    pub inv_comment: String,
    /// Parent of a distribution sub-invoice
    #[serde(skip_serializing, deserialize_with = "json::opt_int")]
    pub parent_id: Option<i64>,
    /// Invoice this one corrects
    #[serde(deserialize_with = "json::int")]
    pub prev_correction_id: i64,
    #[serde(skip_serializing, deserialize_with = "json::opt_int")]
    pub next_correction_id: Option<i64>,
    #[serde(deserialize_with = "json::text")]
    pub template_name: String,
    /// 1 seller, 2 buyer, 3 transporter
    #[serde(skip_serializing, deserialize_with = "json::int")]
    pub user_role: i64,
    #[serde(deserialize_with = "json::list")]
    pub invoice_goods: Vec<InvoiceGoods>,
    #[serde(serialize_with = "json::empty_list", deserialize_with = "json::list")]
    pub invoice_parent_goods: Vec<InvoiceGoods>,
    #[serde(deserialize_with = "json::list")]
    pub invoice_return: Vec<InvoiceReturn>,
    #[serde(serialize_with = "json::empty_list", deserialize_with = "json::list")]
    pub sub_invoices_distribution: Vec<SubInvoiceDistribution>,
    #[serde(deserialize_with = "json::list")]
    pub invoice_advance: Vec<InvoiceAdvance>,
    /// Petroleum documents, passed through untouched
    #[serde(deserialize_with = "json::raw_list")]
    pub invoice_oil_docs: Vec<Value>,
}

impl Invoice {
    /// Append a goods line with `amount = round2(quantity * unit_price)`
    ///
    /// The line takes unit 1 and standard VAT; adjust the returned line for
    /// anything else. Invoice totals are left untouched.
    pub fn add_goods(&mut self, goods_name: &str, quantity: f64, unit_price: f64) -> &mut InvoiceGoods {
        self.invoice_goods.push(InvoiceGoods {
            goods_name: goods_name.to_string(),
            quantity,
            unit_price,
            amount: round2(quantity * unit_price),
            unit_id: 1,
            vat_type: Code::Known(InvoiceVatType::Standard),
            ..InvoiceGoods::default()
        });
        let last = self.invoice_goods.len() - 1;
        &mut self.invoice_goods[last]
    }

    /// Parse an `INVOICE` object
    pub fn from_json(value: &Value) -> Self {
        json::record(value)
    }

    /// The writable fields as the service expects them
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Invoice status entry from `/Invoice/GetActions`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct InvoiceAction {
    #[serde(deserialize_with = "json::int")]
    pub id: i64,
    #[serde(deserialize_with = "json::text")]
    pub name: String,
    #[serde(deserialize_with = "json::int")]
    pub seller_action: i64,
    #[serde(deserialize_with = "json::int")]
    pub buyer_action: i64,
}

/// Measurement unit
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Unit {
    #[serde(deserialize_with = "json::text")]
    pub value: String,
    #[serde(deserialize_with = "json::text")]
    pub label: String,
}

/// Registry data of a taxpayer
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct OrgInfo {
    #[serde(deserialize_with = "json::text")]
    pub tin: String,
    #[serde(deserialize_with = "json::text")]
    pub address: String,
    #[serde(deserialize_with = "json::flag")]
    pub is_vat_payer: bool,
    #[serde(deserialize_with = "json::flag")]
    pub is_diplomat: bool,
    #[serde(deserialize_with = "json::text")]
    pub name: String,
}

/// Entry of the eAPI barcode catalog
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct BarCode {
    #[serde(deserialize_with = "json::text")]
    pub barcode: String,
    #[serde(deserialize_with = "json::text")]
    pub goods_name: String,
    #[serde(deserialize_with = "json::int")]
    pub unit_id: i64,
    #[serde(deserialize_with = "json::text")]
    pub unit_txt: String,
    pub vat_type: Code<InvoiceVatType>,
    #[serde(deserialize_with = "json::text")]
    pub vat_type_txt: String,
    #[serde(deserialize_with = "json::decimal")]
    pub unit_price: f64,
}

/// Outcome of an asynchronous save or activation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TransactionResult {
    /// 0 while the transaction is still pending
    #[serde(deserialize_with = "json::int")]
    pub invoice_id: i64,
}

/// One row of the excise product table
///
/// Column names vary between service versions, so the row keeps its fields
/// by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExciseRecord {
    fields: Map<String, Value>,
}

impl ExciseRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn text(&self, key: &str) -> String {
        self.get(key).map(as_text).unwrap_or_default()
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(as_int)
    }

    pub fn decimal(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(as_decimal)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn sample_invoice() -> Invoice {
        let mut invoice = Invoice {
            inv_category: Code::Known(InvoiceCategory::GoodsService),
            inv_type: Code::Known(InvoiceType::WithTransport),
            tin_buyer: "206322102".to_string(),
            operation_date: "2024-03-15T00:00:00".to_string(),
            trans_cost: "25.50".to_string(),
            amount_full: 2400.0,
            ..Invoice::default()
        };
        invoice.add_goods("მაცივარი", 2.0, 1200.0);
        invoice
    }

    #[test]
    fn test_round_trip_preserves_writable_fields() {
        let invoice = sample_invoice();
        let back = Invoice::from_json(&invoice.to_json());

        assert_eq!(back.inv_category, Code::Known(InvoiceCategory::GoodsService));
        assert_eq!(back.tin_buyer, "206322102");
        assert_eq!(back.invoice_goods.len(), 1);
        assert_eq!(back.invoice_goods[0].goods_name, "მაცივარი");
        assert_eq!(back.invoice_goods[0].amount, 2400.0);
        assert_eq!(back, invoice);
    }

    #[test]
    fn test_serialized_shape() {
        let mut invoice = sample_invoice();
        invoice.sub_invoices_distribution.push(SubInvoiceDistribution::default());
        invoice.name_buyer = "should not be sent".to_string();
        invoice.parent_id = Some(7);
        let wire = invoice.to_json();

        assert_eq!(wire["FOREIGN_BUYER"], json!("false"));
        assert_eq!(wire["TRANS_DRIVER_FOREIGN"], json!("false"));
        assert_eq!(wire["TRANS_COST"], json!("25.50"));
        assert_eq!(wire["INV_CATEGORY"], json!(1));
        assert_eq!(wire["INVOICE_PARENT_GOODS"], json!([]));
        assert_eq!(wire["SUB_INVOICES_DISTRIBUTION"], json!([]));
        assert!(wire.get("NAME_BUYER").is_none());
        assert!(wire.get("PARENT_ID").is_none());
        assert!(wire.get("ACTIVATE_DATE").is_none());
        assert!(wire["INVOICE_GOODS"][0].get("VAT_TYPE_TXT").is_none());
    }

    #[test]
    fn test_add_goods_leaves_totals_alone() {
        let mut invoice = Invoice::default();
        let line = invoice.add_goods("ფქვილი", 3.0, 0.1);
        assert_eq!(line.amount, 0.3);
        assert_eq!(line.unit_id, 1);
        assert_eq!(invoice.amount_full, 0.0);
    }

    #[test]
    fn test_nulls_take_defaults() {
        let invoice = Invoice::from_json(&json!({
            "ID": null,
            "AMOUNT_FULL": null,
            "INV_CATEGORY": "9",
            "SEQNUM_SELLER": null,
            "PARENT_ID": "15",
            "FOREIGN_BUYER": "true",
            "INVOICE_GOODS": null,
            "INVOICE_OIL_DOCS": [{ "DOC_N": 1 }]
        }));

        assert_eq!(invoice.id, 0);
        assert_eq!(invoice.amount_full, 0.0);
        assert_eq!(invoice.inv_category, Code::Raw(9));
        assert_eq!(invoice.seqnum_seller, None);
        assert_eq!(invoice.parent_id, Some(15));
        assert!(invoice.foreign_buyer);
        assert!(invoice.invoice_goods.is_empty());
        assert_eq!(invoice.invoice_oil_docs.len(), 1);
    }

    #[test]
    fn test_advance_omits_empty_operation_date() {
        let advance = InvoiceAdvance { id: 3, amount: 100.0, ..InvoiceAdvance::default() };
        let wire = serde_json::to_value(&advance).unwrap();
        assert_eq!(wire, json!({ "ID": 3, "AMOUNT": 100.0 }));

        let ret = InvoiceReturn { return_invoice_id: 9, buyer: "x".to_string(), ..InvoiceReturn::default() };
        assert_eq!(serde_json::to_value(&ret).unwrap(), json!({ "RETURN_INVOICE_ID": 9 }));
    }

    #[rstest]
    #[case("", "", false)]
    #[case("", "pin", true)]
    #[case("tok", "", false)]
    #[case("tok", "pin", false)]
    fn test_needs_pin(#[case] access: &str, #[case] pin: &str, #[case] expected: bool) {
        let response = InvoiceAuthResponse::from_response(&json!({
            "DATA": { "ACCESS_TOKEN": access, "PIN_TOKEN": pin },
            "STATUS": { "ID": 0 }
        }));
        assert_eq!(response.needs_pin(), expected);
    }

    #[test]
    fn test_org_info_pascal_case() {
        let org: OrgInfo = json::record(&json!({
            "Tin": "206322102",
            "Name": "შპს ტესტი",
            "IsVatPayer": true,
            "IsDiplomat": null
        }));
        assert_eq!(org.tin, "206322102");
        assert!(org.is_vat_payer);
        assert!(!org.is_diplomat);
    }

    #[test]
    fn test_excise_record_accessors() {
        let mut fields = Map::new();
        fields.insert("ID".to_string(), json!("12"));
        fields.insert("PRODUCT_NAME".to_string(), json!("ლუდი"));
        fields.insert("RATE".to_string(), json!(0.12));
        let row = ExciseRecord::new(fields);

        assert_eq!(row.int("ID"), Some(12));
        assert_eq!(row.text("PRODUCT_NAME"), "ლუდი");
        assert_eq!(row.decimal("RATE"), Some(0.12));
        assert_eq!(row.text("MISSING"), "");
    }
}
