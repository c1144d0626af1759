use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Raw field values as typed into the active form.
pub type FieldMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormType {
    Patient,
    Sponsor,
    Physician,
}

impl FormType {
    pub const ALL: [FormType; 3] = [FormType::Patient, FormType::Sponsor, FormType::Physician];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Patient => "patient",
            FormType::Sponsor => "sponsor",
            FormType::Physician => "physician",
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(FormType::Patient),
            "sponsor" => Ok(FormType::Sponsor),
            "physician" => Ok(FormType::Physician),
            other => Err(format!("Unknown form type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInquiry {
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorInquiry {
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicianInquiry {
    pub full_name: String,
    pub institution: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    pub message: String,
}

/// One inquiry payload, discriminated by form type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inquiry {
    Patient(PatientInquiry),
    Sponsor(SponsorInquiry),
    Physician(PhysicianInquiry),
}

impl Inquiry {
    /// Build a draft from whatever the visitor has typed so far.
    ///
    /// Missing required fields become empty strings so the validator can
    /// report them; blank optional fields are dropped. Names that do not
    /// belong to `form_type` are ignored.
    pub fn from_fields(form_type: FormType, fields: &FieldMap) -> Self {
        let required = |name: &str| fields.get(name).cloned().unwrap_or_default();
        let optional = |name: &str| {
            fields
                .get(name)
                .filter(|v| !v.trim().is_empty())
                .cloned()
        };

        match form_type {
            FormType::Patient => Inquiry::Patient(PatientInquiry {
                full_name: required("fullName"),
                email: required("email"),
                phone: optional("phone"),
                message: required("message"),
            }),
            FormType::Sponsor => Inquiry::Sponsor(SponsorInquiry {
                company_name: required("companyName"),
                contact_person: required("contactPerson"),
                email: required("email"),
                phone: optional("phone"),
                interest: optional("interest"),
                message: required("message"),
            }),
            FormType::Physician => Inquiry::Physician(PhysicianInquiry {
                full_name: required("fullName"),
                institution: required("institution"),
                email: required("email"),
                phone: optional("phone"),
                specialty: optional("specialty"),
                message: required("message"),
            }),
        }
    }

    pub fn form_type(&self) -> FormType {
        match self {
            Inquiry::Patient(_) => FormType::Patient,
            Inquiry::Sponsor(_) => FormType::Sponsor,
            Inquiry::Physician(_) => FormType::Physician,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Inquiry::Patient(p) => &p.email,
            Inquiry::Sponsor(s) => &s.email,
            Inquiry::Physician(p) => &p.email,
        }
    }

    /// Serialize the variant's fields as the `data` object of a record.
    pub fn data(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Inquiry::Patient(p) => serde_json::to_value(p),
            Inquiry::Sponsor(s) => serde_json::to_value(s),
            Inquiry::Physician(p) => serde_json::to_value(p),
        }
    }

    /// Rebuild a variant from a record's `formType` and `data`.
    pub fn from_data(form_type: FormType, data: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match form_type {
            FormType::Patient => Inquiry::Patient(serde_json::from_value(data)?),
            FormType::Sponsor => Inquiry::Sponsor(serde_json::from_value(data)?),
            FormType::Physician => Inquiry::Physician(serde_json::from_value(data)?),
        })
    }
}
