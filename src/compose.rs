use crate::config::{Config, FormConfig, SiteConfig};
use crate::form::{FormKind, SubmissionForm, ValidatedSubmission};
use chrono::NaiveDateTime;

pub const PLACEHOLDER: &str = "未入力";
const RULE: &str = "─────────────────";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: String,
    pub from: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessages {
    pub owner: OutgoingMessage,
    pub submitter: OutgoingMessage,
}

struct Wording {
    intro: &'static str,
    thanks: &'static str,
    received: &'static str,
    follow_up: &'static str,
}

fn wording(kind: FormKind) -> Wording {
    match kind {
        FormKind::Contact => Wording {
            intro: "お問い合わせがありました。",
            thanks: "お問い合わせいただき",
            received: "お問い合わせ",
            follow_up: "3営業日以内にご返信させていただきます。",
        },
        FormKind::Order => Wording {
            intro: "制作依頼がありました。",
            thanks: "制作依頼をいただき",
            received: "制作依頼",
            follow_up: "3営業日以内にお見積もりをご連絡させていただきます。",
        },
    }
}

/// Builds the owner notification and the submitter acknowledgement from one
/// screened submission.
#[derive(Debug, Clone)]
pub struct NotificationComposer {
    site: SiteConfig,
    contact: FormConfig,
    order: FormConfig,
}

impl NotificationComposer {
    pub fn new(config: &Config) -> Self {
        Self {
            site: config.site.clone(),
            contact: config.contact.clone(),
            order: config.order.clone(),
        }
    }

    pub fn compose(&self, submission: &ValidatedSubmission, at: NaiveDateTime) -> ComposedMessages {
        let kind = submission.form.kind();
        let form = match kind {
            FormKind::Contact => &self.contact,
            FormKind::Order => &self.order,
        };
        let wording = wording(kind);
        let sections = render_sections(submission);

        let mut owner_body = format!("{}\n\n", wording.intro);
        owner_body.push_str(&sections);
        owner_body.push_str(&format!(
            "■ 送信日時\n{}\n",
            at.format("%Y年%-m月%-d日 %H時%M分")
        ));

        let mut submitter_body = format!("{} 様\n\n", submission.form.name());
        submitter_body.push_str(&format!(
            "この度は、{}に{}、誠にありがとうございます。\n\n",
            self.site.name, wording.thanks
        ));
        submitter_body.push_str(&format!(
            "以下の内容で{}を受付いたしました。\n",
            wording.received
        ));
        submitter_body.push_str(&format!("{}\n\n", wording.follow_up));
        submitter_body.push_str("【受付内容】\n");
        submitter_body.push_str(&sections);
        submitter_body.push_str(RULE);
        submitter_body.push('\n');
        for line in &self.site.signature {
            submitter_body.push_str(line);
            submitter_body.push('\n');
        }

        ComposedMessages {
            owner: OutgoingMessage {
                to: self.site.owner_address.clone(),
                from: self.site.from_address.clone(),
                reply_to: Some(submission.form.email().to_string()),
                subject: form.owner_subject.clone(),
                body: owner_body,
            },
            submitter: OutgoingMessage {
                to: submission.form.email().to_string(),
                from: self.site.from_address.clone(),
                reply_to: None,
                subject: form.acknowledgement_subject.clone(),
                body: submitter_body,
            },
        }
    }
}

fn or_placeholder(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(PLACEHOLDER)
}

/// Labelled sections in their fixed order. Optional sections are never
/// dropped; they carry the placeholder instead. The submission time is added
/// to the owner notification only.
pub fn sections(submission: &ValidatedSubmission) -> Vec<(&'static str, String)> {
    let mut sections: Vec<(&'static str, String)> = Vec::new();
    match &submission.form {
        SubmissionForm::ContactInquiry(c) => {
            sections.push(("お名前", c.name.clone()));
            sections.push(("メールアドレス", c.email.clone()));
            sections.push(("電話番号", or_placeholder(c.phone.as_deref()).to_string()));
            sections.push(("お問い合わせ種別", submission.type_label.clone()));
            sections.push(("件名", c.subject.clone()));
            sections.push(("お問い合わせ内容", c.message.clone()));
        }
        SubmissionForm::CommissionRequest(c) => {
            sections.push(("お名前", c.name.clone()));
            sections.push(("メールアドレス", c.email.clone()));
            sections.push(("電話番号", or_placeholder(c.phone.as_deref()).to_string()));
            sections.push(("制作種別", submission.type_label.clone()));
            sections.push(("プロジェクト名・タイトル", c.project_title.clone()));
            sections.push(("制作内容の詳細", c.description.clone()));
            sections.push(("希望納期", or_placeholder(c.deadline.as_deref()).to_string()));
            sections.push((
                "ご予算",
                or_placeholder(submission.budget_label.as_deref()).to_string(),
            ));
            sections.push((
                "参考資料・イメージ",
                or_placeholder(c.reference.as_deref()).to_string(),
            ));
            sections.push(("その他ご要望", or_placeholder(c.notes.as_deref()).to_string()));
        }
    }
    sections
}

fn render_sections(submission: &ValidatedSubmission) -> String {
    sections(submission)
        .iter()
        .map(|(label, value)| format!("■ {label}\n{value}\n\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{CommissionRequest, ContactInquiry};
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 2)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap()
    }

    fn bare_commission() -> ValidatedSubmission {
        ValidatedSubmission::translate(SubmissionForm::CommissionRequest(CommissionRequest {
            name: "田中".to_string(),
            email: "a@b.co".to_string(),
            phone: None,
            project_type: "icon".to_string(),
            project_title: "ロゴ制作".to_string(),
            description: "カフェのロゴをお願いします。".to_string(),
            budget: None,
            deadline: None,
            reference: None,
            notes: None,
        }))
    }

    #[test]
    fn test_optional_sections_keep_placeholders_in_order() {
        let composer = NotificationComposer::new(&Config::default());
        let messages = composer.compose(&bare_commission(), at());

        let labels = [
            "■ お名前\n田中",
            "■ メールアドレス\na@b.co",
            "■ 電話番号\n未入力",
            "■ 制作種別\nアイコン・ロゴ",
            "■ プロジェクト名・タイトル\nロゴ制作",
            "■ 制作内容の詳細\n",
            "■ 希望納期\n未入力",
            "■ ご予算\n未入力",
            "■ 参考資料・イメージ\n未入力",
            "■ その他ご要望\n未入力",
        ];
        for body in [&messages.owner.body, &messages.submitter.body] {
            let mut cursor = 0;
            for label in labels {
                let found = body[cursor..]
                    .find(label)
                    .unwrap_or_else(|| panic!("missing or out of order: {label}"));
                cursor += found + label.len();
            }
        }
    }

    #[test]
    fn test_timestamp_only_in_owner_message() {
        let composer = NotificationComposer::new(&Config::default());
        let messages = composer.compose(&bare_commission(), at());

        assert!(messages
            .owner
            .body
            .ends_with("■ その他ご要望\n未入力\n\n■ 送信日時\n2025年10月2日 09時05分\n"));
        assert!(!messages.submitter.body.contains("送信日時"));
    }

    #[test]
    fn test_reply_to_only_on_owner_message() {
        let config = Config::default();
        let composer = NotificationComposer::new(&config);
        let messages = composer.compose(&bare_commission(), at());

        assert_eq!(messages.owner.to, config.site.owner_address);
        assert_eq!(messages.owner.reply_to.as_deref(), Some("a@b.co"));
        assert_eq!(messages.owner.subject, config.order.owner_subject);

        assert_eq!(messages.submitter.to, "a@b.co");
        assert_eq!(messages.submitter.reply_to, None);
        assert_eq!(messages.submitter.subject, config.order.acknowledgement_subject);
    }

    #[test]
    fn test_acknowledgement_wording() {
        let config = Config::default();
        let composer = NotificationComposer::new(&config);
        let submission = ValidatedSubmission::translate(SubmissionForm::ContactInquiry(
            ContactInquiry {
                name: "田中".to_string(),
                email: "a@b.co".to_string(),
                phone: Some("090-1234-5678".to_string()),
                inquiry_type: "general".to_string(),
                subject: "Hello!!".to_string(),
                message: "0123456789".to_string(),
            },
        ));
        let messages = composer.compose(&submission, at());

        assert!(messages.owner.body.starts_with("お問い合わせがありました。\n\n■ お名前\n田中\n\n"));
        assert!(messages.owner.body.contains("■ お問い合わせ種別\n一般的なご質問\n\n"));
        assert!(messages.owner.body.contains("■ 電話番号\n090-1234-5678\n\n"));

        let ack = &messages.submitter.body;
        assert!(ack.starts_with("田中 様\n\n"));
        assert!(ack.contains("以下の内容でお問い合わせを受付いたしました。\n"));
        assert!(ack.contains("【受付内容】\n■ お名前\n田中\n\n"));
        assert!(ack.ends_with(&format!("{}\n", config.site.signature.join("\n"))));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let composer = NotificationComposer::new(&Config::default());
        let submission = bare_commission();
        assert_eq!(
            composer.compose(&submission, at()),
            composer.compose(&submission, at())
        );
    }
}
