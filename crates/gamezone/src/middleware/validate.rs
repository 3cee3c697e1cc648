use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// JSON body that must pass its `validator` rules. Failures answer 400 with
/// one message per offending field.
pub struct SimpleValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for SimpleValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = (StatusCode, axum::Json<Value>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                let payload = json!({
                    "status": "error",
                    "message": rejection.body_text(),
                });
                (StatusCode::BAD_REQUEST, axum::Json(payload))
            })?;

        value.validate().map_err(|errors| {
            let fields = field_messages(&errors);
            let summary = fields
                .iter()
                .flat_map(|(field, messages)| {
                    messages.iter().map(move |message| format!("{field}: {message}"))
                })
                .collect::<Vec<_>>()
                .join("; ");
            let message = if summary.is_empty() {
                "Validation failed".to_string()
            } else {
                summary
            };

            let payload = json!({
                "status": "error",
                "message": message,
                "details": fields,
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload))
        })?;

        Ok(Self(value))
    }
}

/// Flattens nested structs into dotted paths, e.g. `shipping_address.pincode`.
fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    collect(errors, "", &mut out);
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut BTreeMap<String, Vec<String>>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors.iter().map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| match error.code.as_ref() {
                            "email" => "Invalid email format".to_string(),
                            "length" => "Invalid length".to_string(),
                            "range" => "Value out of range".to_string(),
                            _ => format!("Invalid {field}"),
                        })
                });
                out.entry(path).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::requests::{PlaceOrderRequest, RegisterRequest};

    #[test]
    fn nested_errors_use_dotted_paths() {
        let req: PlaceOrderRequest = serde_json::from_value(json!({
            "shipping_address": {
                "name": "Asha",
                "phone": "9876543210",
                "street": "12 MG Road",
                "city": "Bengaluru",
                "state": "Karnataka",
                "pincode": "1"
            }
        }))
        .unwrap();

        let fields = field_messages(&req.validate().unwrap_err());

        assert_eq!(
            fields.get("shipping_address.pincode"),
            Some(&vec!["Pincode must be 4 to 10 characters".to_string()])
        );
    }

    #[test]
    fn every_failing_field_is_reported() {
        let req = RegisterRequest {
            name: "A".to_string(),
            email: "not-an-email".to_string(),
            phone: "9876543210".to_string(),
            password: "123".to_string(),
        };

        let fields = field_messages(&req.validate().unwrap_err());

        assert_eq!(
            fields.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["email", "name", "password"]
        );
    }
}
