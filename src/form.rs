use crate::codes::{BUDGETS, INQUIRY_TYPES, PROJECT_TYPES};
use crate::error::UnknownFormKind;
use crate::rules::{FieldKind, FieldSpec};
use crate::sanitize::SanitizedFields;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod field {
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const INQUIRY_TYPE: &str = "inquiry-type";
    pub const SUBJECT: &str = "subject";
    pub const MESSAGE: &str = "message";
    pub const PROJECT_TYPE: &str = "project-type";
    pub const PROJECT_TITLE: &str = "project-title";
    pub const PROJECT_DESCRIPTION: &str = "project-description";
    pub const BUDGET: &str = "budget";
    pub const DEADLINE: &str = "deadline";
    pub const REFERENCE: &str = "reference";
    pub const NOTES: &str = "additional-notes";
}

// Document order of each form's controls.
static CONTACT_FIELDS: [FieldSpec; 6] = [
    FieldSpec::required(field::NAME, FieldKind::Text),
    FieldSpec::required(field::EMAIL, FieldKind::Email),
    FieldSpec::optional(field::PHONE, FieldKind::Tel),
    FieldSpec::required(field::INQUIRY_TYPE, FieldKind::Select),
    FieldSpec::required(field::SUBJECT, FieldKind::Text),
    FieldSpec::required(field::MESSAGE, FieldKind::TextArea),
];

static ORDER_FIELDS: [FieldSpec; 10] = [
    FieldSpec::required(field::NAME, FieldKind::Text),
    FieldSpec::required(field::EMAIL, FieldKind::Email),
    FieldSpec::optional(field::PHONE, FieldKind::Tel),
    FieldSpec::required(field::PROJECT_TYPE, FieldKind::Select),
    FieldSpec::required(field::PROJECT_TITLE, FieldKind::Text),
    FieldSpec::required(field::PROJECT_DESCRIPTION, FieldKind::TextArea),
    FieldSpec::optional(field::BUDGET, FieldKind::Select),
    FieldSpec::optional(field::DEADLINE, FieldKind::Date).today_or_later(),
    FieldSpec::optional(field::REFERENCE, FieldKind::Text),
    FieldSpec::optional(field::NOTES, FieldKind::TextArea),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Contact,
    Order,
}

impl FormKind {
    pub const ALL: [FormKind; 2] = [FormKind::Contact, FormKind::Order];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Contact => "contact",
            FormKind::Order => "order",
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            FormKind::Contact => &CONTACT_FIELDS,
            FormKind::Order => &ORDER_FIELDS,
        }
    }

    /// Fields whose values can end up in a mail header.
    pub fn header_fields(&self) -> [&'static str; 3] {
        match self {
            FormKind::Contact => [field::NAME, field::SUBJECT, field::EMAIL],
            FormKind::Order => [field::NAME, field::PROJECT_TITLE, field::EMAIL],
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = UnknownFormKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contact" => Ok(FormKind::Contact),
            "order" | "commission" => Ok(FormKind::Order),
            _ => Err(UnknownFormKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInquiry {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub inquiry_type: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub project_type: String,
    pub project_title: String,
    pub description: String,
    pub budget: Option<String>,
    pub deadline: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionForm {
    ContactInquiry(ContactInquiry),
    CommissionRequest(CommissionRequest),
}

impl SubmissionForm {
    pub fn from_fields(kind: FormKind, fields: &SanitizedFields) -> Self {
        match kind {
            FormKind::Contact => SubmissionForm::ContactInquiry(ContactInquiry {
                name: fields.get(field::NAME).to_string(),
                email: fields.get(field::EMAIL).to_string(),
                phone: fields.optional(field::PHONE),
                inquiry_type: fields.get(field::INQUIRY_TYPE).to_string(),
                subject: fields.get(field::SUBJECT).to_string(),
                message: fields.get(field::MESSAGE).to_string(),
            }),
            FormKind::Order => SubmissionForm::CommissionRequest(CommissionRequest {
                name: fields.get(field::NAME).to_string(),
                email: fields.get(field::EMAIL).to_string(),
                phone: fields.optional(field::PHONE),
                project_type: fields.get(field::PROJECT_TYPE).to_string(),
                project_title: fields.get(field::PROJECT_TITLE).to_string(),
                description: fields.get(field::PROJECT_DESCRIPTION).to_string(),
                budget: fields.optional(field::BUDGET),
                deadline: fields.optional(field::DEADLINE),
                reference: fields.optional(field::REFERENCE),
                notes: fields.optional(field::NOTES),
            }),
        }
    }

    pub fn kind(&self) -> FormKind {
        match self {
            SubmissionForm::ContactInquiry(_) => FormKind::Contact,
            SubmissionForm::CommissionRequest(_) => FormKind::Order,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SubmissionForm::ContactInquiry(c) => &c.name,
            SubmissionForm::CommissionRequest(c) => &c.name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            SubmissionForm::ContactInquiry(c) => &c.email,
            SubmissionForm::CommissionRequest(c) => &c.email,
        }
    }
}

/// A screened submission with its coded fields resolved to display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub form: SubmissionForm,
    pub type_label: String,
    pub budget_label: Option<String>,
}

impl ValidatedSubmission {
    pub fn translate(form: SubmissionForm) -> Self {
        let (type_label, budget_label) = match &form {
            SubmissionForm::ContactInquiry(c) => {
                (INQUIRY_TYPES.display(&c.inquiry_type).to_string(), None)
            }
            SubmissionForm::CommissionRequest(c) => (
                PROJECT_TYPES.display(&c.project_type).to_string(),
                c.budget
                    .as_deref()
                    .map(|code| BUDGETS.display(code).to_string()),
            ),
        };

        Self {
            form,
            type_label,
            budget_label,
        }
    }
}
