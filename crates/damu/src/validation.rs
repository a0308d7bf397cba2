//! Field rules for submissions, shared by the server endpoints and the
//! client's pre-flight checks.

use crate::error::ValidationError;
use crate::protocol::{
    BloodRequestSubmission, BloodType, DonationSubmission, DonationType, ThankYouRequest,
};
use serde_json::Value;

/// Parse and check a raw donation body.
pub fn parse_donation(body: &Value) -> Result<DonationSubmission, ValidationError> {
    let obj = as_object(body)?;
    let submission = DonationSubmission {
        donor_name: required_str(obj, "donorName")?.to_string(),
        blood_type: required_str(obj, "bloodType")?.parse::<BloodType>()?,
        donation_type: required_str(obj, "donationType")?.parse::<DonationType>()?,
        location: required_str(obj, "location")?.to_string(),
    };
    Ok(submission)
}

/// Parse and check a raw blood request body. `units` must be a JSON integer
/// greater than zero; numeric strings and fractions are refused.
pub fn parse_blood_request(body: &Value) -> Result<BloodRequestSubmission, ValidationError> {
    let obj = as_object(body)?;
    let hospital_name = required_str(obj, "hospitalName")?.to_string();
    let blood_type = required_str(obj, "bloodType")?.parse::<BloodType>()?;
    let units = obj
        .get("units")
        .and_then(Value::as_u64)
        .filter(|u| *u > 0)
        .and_then(|u| u32::try_from(u).ok())
        .ok_or(ValidationError::InvalidUnits)?;
    let reason = required_str(obj, "reason")?.to_string();
    Ok(BloodRequestSubmission {
        hospital_name,
        blood_type,
        units,
        reason,
    })
}

pub fn parse_thank_you(body: &Value) -> Result<ThankYouRequest, ValidationError> {
    let obj = as_object(body)?;
    Ok(ThankYouRequest {
        donor_name: required_str(obj, "donorName")?.to_string(),
    })
}

/// Trimmed, non-empty agent display name.
pub fn agent_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::Blank("agentName"));
    }
    Ok(name.to_string())
}

impl DonationSubmission {
    /// Field checks the type system cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_blank(&self.donor_name, "donorName")?;
        non_blank(&self.location, "location")?;
        Ok(())
    }
}

impl BloodRequestSubmission {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_blank(&self.hospital_name, "hospitalName")?;
        non_blank(&self.reason, "reason")?;
        if self.units == 0 {
            return Err(ValidationError::InvalidUnits);
        }
        Ok(())
    }
}

fn as_object(body: &Value) -> Result<&serde_json::Map<String, Value>, ValidationError> {
    body.as_object()
        .ok_or_else(|| ValidationError::Malformed("expected a JSON object".into()))
}

fn required_str<'a>(
    obj: &'a serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match obj.get(field).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ValidationError::Blank(field)),
    }
}

fn non_blank(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(units: Value) -> Value {
        json!({
            "hospitalName": "Nairobi Hospital",
            "bloodType": "O-",
            "units": units,
            "reason": "Emergency surgery"
        })
    }

    #[test]
    fn accepts_a_valid_donation() {
        let body = json!({
            "donorName": "Jane Doe",
            "bloodType": "A+",
            "donationType": "Agent Pickup",
            "location": "123 Biashara St"
        });
        let sub = parse_donation(&body).unwrap();
        assert_eq!(sub.blood_type, BloodType::APositive);
        assert_eq!(sub.donation_type, DonationType::Pickup);
        assert!(sub.validate().is_ok());
    }

    #[test]
    fn whitespace_donor_name_is_blank() {
        let body = json!({
            "donorName": "   ",
            "bloodType": "A+",
            "donationType": "Center",
            "location": "KNH"
        });
        assert_eq!(
            parse_donation(&body),
            Err(ValidationError::Blank("donorName"))
        );
    }

    #[test]
    fn missing_and_non_string_fields_are_blank() {
        let body = json!({ "donorName": 7, "bloodType": "A+", "donationType": "Center" });
        assert_eq!(
            parse_donation(&body),
            Err(ValidationError::Blank("donorName"))
        );
        let body = json!({ "donorName": "Ann", "bloodType": "A+", "donationType": "Center" });
        assert_eq!(parse_donation(&body), Err(ValidationError::Blank("location")));
    }

    #[test]
    fn unknown_blood_type_is_rejected() {
        let body = json!({
            "donorName": "Ann",
            "bloodType": "Z+",
            "donationType": "Center",
            "location": "KNH"
        });
        assert!(matches!(
            parse_donation(&body),
            Err(ValidationError::UnknownBloodType(_))
        ));
    }

    #[test]
    fn units_must_be_a_positive_integer() {
        for bad in [json!(0), json!(-1), json!(2.5), json!("2"), Value::Null] {
            assert_eq!(
                parse_blood_request(&request(bad.clone())),
                Err(ValidationError::InvalidUnits),
                "units = {bad}"
            );
        }
        assert_eq!(parse_blood_request(&request(json!(2))).unwrap().units, 2);
    }

    #[test]
    fn non_object_body_is_malformed() {
        assert!(matches!(
            parse_thank_you(&json!(["Jane"])),
            Err(ValidationError::Malformed(_))
        ));
        assert_eq!(
            parse_thank_you(&json!({"donorName": ""})),
            Err(ValidationError::Blank("donorName"))
        );
    }

    #[test]
    fn agent_name_is_trimmed() {
        assert_eq!(agent_name("  Wanjiru ").unwrap(), "Wanjiru");
        assert_eq!(agent_name(" \t"), Err(ValidationError::Blank("agentName")));
    }

    #[test]
    fn typed_submissions_recheck_blank_fields() {
        let sub = BloodRequestSubmission {
            hospital_name: "KNH".into(),
            blood_type: BloodType::BNegative,
            units: 0,
            reason: "stock".into(),
        };
        assert_eq!(sub.validate(), Err(ValidationError::InvalidUnits));
    }
}
