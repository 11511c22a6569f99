use serde::Deserialize;
use serde_json::Value;

use crate::codec::json::{self, as_int, as_text, path};

/// Response of the customs authentication endpoints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomsAuthResponse {
    pub access_token: String,
    pub pin_token: String,
    pub status: i64,
    pub message: String,
}

impl CustomsAuthResponse {
    pub fn from_response(response: &Value) -> Self {
        Self {
            access_token: as_text(path(response, &["DATA", "ACCESS_TOKEN"])),
            pin_token: as_text(path(response, &["DATA", "PIN_TOKEN"])),
            status: as_int(path(response, &["STATUS", "CODE"])).unwrap_or(0),
            message: as_text(path(response, &["STATUS", "MESSAGE"])),
        }
    }

    pub fn needs_pin(&self) -> bool {
        !self.pin_token.is_empty() && self.access_token.is_empty()
    }
}

/// One assessed ASYCUDA declaration line
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CustomsDeclaration {
    #[serde(deserialize_with = "json::text")]
    pub declaration_number: String,
    #[serde(deserialize_with = "json::text")]
    pub assessment_date: String,
    /// HS commodity code
    #[serde(deserialize_with = "json::text")]
    pub commodity_code: String,
    #[serde(deserialize_with = "json::text")]
    pub description: String,
    #[serde(deserialize_with = "json::decimal")]
    pub quantity: f64,
    /// Kilograms
    #[serde(deserialize_with = "json::decimal")]
    pub net_weight: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub gross_weight: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub statistical_value: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub customs_value: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub duty_amount: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub vat_amount: f64,
    #[serde(deserialize_with = "json::decimal")]
    pub excise_amount: f64,
    #[serde(deserialize_with = "json::text")]
    pub country_of_origin: String,
    #[serde(deserialize_with = "json::text")]
    pub country_of_dispatch: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_declaration_parsing() {
        let decl: CustomsDeclaration = json::record(&json!({
            "DECLARATION_NUMBER": "C-2024-1001",
            "COMMODITY_CODE": 8418102001u64,
            "QUANTITY": "12",
            "NET_WEIGHT": 540.5,
            "DUTY_AMOUNT": null,
            "COUNTRY_OF_ORIGIN": "TR"
        }));

        assert_eq!(decl.declaration_number, "C-2024-1001");
        assert_eq!(decl.commodity_code, "8418102001");
        assert_eq!(decl.quantity, 12.0);
        assert_eq!(decl.net_weight, 540.5);
        assert_eq!(decl.duty_amount, 0.0);
        assert_eq!(decl.country_of_dispatch, "");
    }

    #[test]
    fn test_auth_response() {
        let response = CustomsAuthResponse::from_response(&json!({
            "DATA": { "PIN_TOKEN": "p-1" },
            "STATUS": { "CODE": 0, "MESSAGE": "OK" }
        }));
        assert!(response.needs_pin());
        assert_eq!(response.message, "OK");
    }
}
