use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::form::Inquiry;

/// Field name -> message shown next to the field. Empty means valid.
pub type FieldErrors = BTreeMap<String, String>;

// Shape check only: something@something.something with no whitespace.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").unwrap());

pub fn is_email_shaped(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn validate(inquiry: &Inquiry) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if !is_email_shaped(inquiry.email()) {
        errors.insert("email".into(), "Please enter a valid email address".into());
    }

    match inquiry {
        Inquiry::Patient(p) => {
            require(&mut errors, "fullName", &p.full_name, "Full name is required");
            require(&mut errors, "message", &p.message, "Please describe your situation");
        }
        Inquiry::Sponsor(s) => {
            require(&mut errors, "companyName", &s.company_name, "Company name is required");
            require(&mut errors, "contactPerson", &s.contact_person, "Contact person is required");
            require(&mut errors, "message", &s.message, "Please describe your proposal");
        }
        Inquiry::Physician(p) => {
            require(&mut errors, "fullName", &p.full_name, "Full name is required");
            require(&mut errors, "institution", &p.institution, "Institution is required");
            require(
                &mut errors,
                "message",
                &p.message,
                "Please describe how we can collaborate",
            );
        }
    }

    errors
}

fn require(errors: &mut FieldErrors, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), message.to_string());
    }
}
