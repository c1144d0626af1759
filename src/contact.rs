use serde::Serialize;

use crate::inquiry::FieldMap;

pub const SUBJECTS: [(&str, &str); 5] = [
    ("partnership", "Partnership Inquiry"),
    ("clinical-trial", "Clinical Trial Information"),
    ("careers", "Career Opportunities"),
    ("media", "Media Inquiry"),
    ("general", "General Question"),
];

#[derive(Debug, Clone, Default)]
pub struct ContactMessage {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub organization: String,
    pub subject: String,
    pub message: String,
}

/// Toast shown to the visitor after pressing send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<&'static str>,
}

impl ContactMessage {
    pub fn from_fields(fields: &FieldMap) -> Self {
        let get = |name: &str| fields.get(name).cloned().unwrap_or_default();
        Self {
            first_name: get("firstName"),
            last_name: get("lastName"),
            email: get("email"),
            organization: get("organization"),
            subject: get("subject"),
            message: get("message"),
        }
    }

    /// Everything but the organization must be filled in. Presence only.
    pub fn is_complete(&self) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.subject,
            &self.message,
        ]
        .iter()
        .all(|v| !v.is_empty())
    }

    pub fn subject_label(&self) -> &str {
        SUBJECTS
            .iter()
            .find(|(value, _)| *value == self.subject)
            .map(|(_, label)| *label)
            .unwrap_or(self.subject.as_str())
    }
}

pub fn review(msg: &ContactMessage) -> Result<Toast, Toast> {
    if !msg.is_complete() {
        return Err(Toast {
            title: "Missing Fields",
            description: "Please fill in all required fields.",
            variant: Some("destructive"),
        });
    }

    Ok(Toast {
        title: "Message Sent!",
        description: "Thank you for your message. We will get back to you soon.",
        variant: None,
    })
}
