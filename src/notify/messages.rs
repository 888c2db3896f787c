//! Message bodies for each notification the workflow sends.

use crate::domain::credential::Credential;
use crate::domain::request::OutpassRequest;

use super::Notification;

pub const STAFF_SUBJECT: &str = "New Outpass Request";
pub const STUDENT_ACK: &str = "Outpass requested. Awaiting approval.";
pub const PARENT_ACK: &str = "Your ward requested an outpass. Awaiting approval.";

/// Minimal escaping for values interpolated into HTML.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn decision_form(action: &str, id: &str, button: &str, label: &str, color: &str) -> String {
    format!(
        r#"<form action="{action}" method="POST" style="display: inline;">
    <input type="hidden" name="id" value="{id}">
    <input type="hidden" name="button" value="{button}">
    <input type="submit" value="{label}"
           style="background-color: {color}; color: white; padding: 10px 20px;
                  border: none; border-radius: 4px; cursor: pointer; margin-right: 10px;">
</form>"#
    )
}

/// Staff-facing decision request with approve/reject actions keyed by id.
pub fn decision_request(staff_email: &str, api_endpoint: &str, record: &OutpassRequest) -> Notification {
    let action = format!("{}/approve", api_endpoint.trim_end_matches('/'));
    let id = escape_html(&record.id);

    let body = format!(
        r#"<html>
<body>
<h2>Outpass Request</h2>
<p><strong>Student:</strong> {name}</p>
<p><strong>Roll Number:</strong> {id}</p>
<p><strong>Reason:</strong> {reason}</p>
<div style="margin-top: 20px;">
{approve}
{reject}
</div>
</body>
</html>"#,
        name = escape_html(&record.student_name),
        reason = escape_html(&record.reason),
        approve = decision_form(&action, &id, "approve", "Approve", "#4CAF50"),
        reject = decision_form(&action, &id, "reject", "Reject", "#f44336"),
    );

    Notification::html_email(staff_email, STAFF_SUBJECT, body)
}

pub fn student_acknowledgement(record: &OutpassRequest) -> Notification {
    Notification::sms(&record.student_mobile, STUDENT_ACK)
}

pub fn parent_acknowledgement(record: &OutpassRequest) -> Notification {
    Notification::sms(&record.parent_mobile, PARENT_ACK)
}

/// Parent notice carrying the credential link and its advertised validity.
pub fn approval_notice(record: &OutpassRequest, credential: &Credential) -> Notification {
    let text = format!(
        "Outpass Approved for {}\nRoll No: {}\nView QR: {}\nValid for {} hours\nDo not share this link",
        record.student_name,
        record.id,
        credential.retrieval_url,
        credential.validity_hours()
    );
    Notification::sms(&record.parent_mobile, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::OutpassStatus;
    use chrono::{Duration, Utc};

    fn record() -> OutpassRequest {
        OutpassRequest {
            id: "R1".to_string(),
            student_name: "A <b>".to_string(),
            student_mobile: "+15550000001".to_string(),
            parent_mobile: "+15550000002".to_string(),
            reason: "home visit".to_string(),
            status: OutpassStatus::Pending,
            created_at: Utc::now(),
            decided_at: None,
        }
    }

    #[test]
    fn test_decision_request_carries_both_actions() {
        let n = decision_request("staff@example.edu", "https://api.example.edu/", &record());
        match n {
            Notification::Email {
                to,
                subject,
                body,
                is_html,
            } => {
                assert_eq!(to, "staff@example.edu");
                assert_eq!(subject, STAFF_SUBJECT);
                assert!(is_html);
                assert!(body.contains(r#"action="https://api.example.edu/approve""#));
                assert!(body.contains(r#"name="id" value="R1""#));
                assert!(body.contains(r#"name="button" value="approve""#));
                assert!(body.contains(r#"name="button" value="reject""#));
                assert!(body.contains("A &lt;b&gt;"));
            }
            other => panic!("expected email, got {:?}", other),
        }
    }

    #[test]
    fn test_acknowledgements_go_to_each_mobile() {
        let r = record();
        assert_eq!(
            student_acknowledgement(&r),
            Notification::sms("+15550000001", STUDENT_ACK)
        );
        assert_eq!(
            parent_acknowledgement(&r),
            Notification::sms("+15550000002", PARENT_ACK)
        );
    }

    #[test]
    fn test_approval_notice_mentions_link_and_window() {
        let r = record();
        let credential = Credential::new(
            "R1",
            "https://cdn.example.edu/R1.png".to_string(),
            Utc::now(),
            Duration::hours(24),
            "secret",
        )
        .unwrap();
        match approval_notice(&r, &credential) {
            Notification::Sms { to, text } => {
                assert_eq!(to, "+15550000002");
                assert!(text.contains("Roll No: R1"));
                assert!(text.contains("View QR: https://cdn.example.edu/R1.png"));
                assert!(text.contains("Valid for 24 hours"));
            }
            other => panic!("expected sms, got {:?}", other),
        }
    }
}
