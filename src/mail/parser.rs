//! Raw RFC 5322 bytes to [`StructuredMail`], via `mail-parser`.

use mail_parser::{Addr, Message, MessageParser, MimeHeaders, PartType};
use tracing::{debug, info};

use crate::error::ParseError;
use crate::mail::model::{Attachment, StructuredMail};

/// Parse a raw message.
///
/// Empty or whitespace-only input is rejected rather than treated as an
/// empty mail.
pub fn parse_email(raw: &[u8]) -> Result<StructuredMail, ParseError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(ParseError::EmptyInput);
    }

    let message = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| ParseError::Malformed("no message structure found".to_string()))?;

    let mail = StructuredMail {
        from: message
            .from()
            .and_then(|addr| addr.first())
            .and_then(format_addr),
        to: message
            .to()
            .map(|addr| addr.iter().filter_map(format_addr).collect())
            .unwrap_or_default(),
        subject: message.subject().map(str::to_string),
        date: message
            .date()
            .and_then(|d| chrono::DateTime::from_timestamp(d.to_timestamp(), 0)),
        text: body_of_kind(&message, BodyKind::Text),
        html: body_of_kind(&message, BodyKind::Html),
        attachments: collect_attachments(&message),
    };

    info!(
        subject = mail.subject.as_deref().unwrap_or(""),
        has_text = mail.text.is_some(),
        has_html = mail.html.is_some(),
        attachments = mail.attachments.len(),
        "Parsed email"
    );
    Ok(mail)
}

#[derive(Clone, Copy)]
enum BodyKind {
    Text,
    Html,
}

/// Concatenate the body parts of one kind.
///
/// `mail-parser` lists an HTML-only part under `text_body` as well, so the
/// part type is checked rather than trusting the index lists.
fn body_of_kind(message: &Message<'_>, kind: BodyKind) -> Option<String> {
    let ids = match kind {
        BodyKind::Text => &message.text_body,
        BodyKind::Html => &message.html_body,
    };

    let parts: Vec<&str> = ids
        .iter()
        .filter_map(|id| message.part(*id))
        .filter_map(|part| match (&part.body, kind) {
            (PartType::Text(text), BodyKind::Text) => Some(text.as_ref()),
            (PartType::Html(html), BodyKind::Html) => Some(html.as_ref()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

fn collect_attachments(message: &Message<'_>) -> Vec<Attachment> {
    message
        .attachments()
        .map(|part| {
            let content_type = MimeHeaders::content_type(part)
                .map(|ct| match ct.subtype() {
                    Some(sub) => format!("{}/{}", ct.ctype(), sub),
                    None => ct.ctype().to_string(),
                })
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let attachment = Attachment::new(
                content_type,
                MimeHeaders::attachment_name(part),
                part.contents().to_vec(),
            );
            debug!(
                name = attachment.display_name(),
                content_type = %attachment.content_type,
                size = attachment.content.len(),
                "Found attachment"
            );
            attachment
        })
        .collect()
}

/// `Name <address>` when a display name exists, otherwise the bare address.
fn format_addr(addr: &Addr<'_>) -> Option<String> {
    match (addr.name(), addr.address()) {
        (Some(name), Some(address)) if !name.is_empty() => Some(format!("{name} <{address}>")),
        (_, Some(address)) => Some(address.to_string()),
        (Some(name), None) => Some(name.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_rejected() {
        assert!(matches!(parse_email(b""), Err(ParseError::EmptyInput)));
        assert!(matches!(parse_email(b"  \r\n\t"), Err(ParseError::EmptyInput)));
    }

    #[test]
    fn minimal_message_with_subject_and_body() {
        let mail = parse_email(b"Subject: Test Email\n\nThis is a test email content.").unwrap();
        assert_eq!(mail.subject.as_deref(), Some("Test Email"));
        assert!(mail
            .text
            .as_deref()
            .unwrap()
            .contains("This is a test email content"));
        assert!(mail.html.is_none());
        assert!(mail.from.is_none());
        assert!(mail.date.is_none());
    }

    #[test]
    fn headers_are_extracted() {
        let raw = "From: Alice Example <alice@example.com>\r\n\
                   To: bob@example.com, carol@example.com\r\n\
                   Subject: Quarterly numbers\r\n\
                   Date: Tue, 1 Jul 2025 10:00:00 +0000\r\n\
                   \r\n\
                   Numbers attached.\r\n";
        let mail = parse_email(raw.as_bytes()).unwrap();
        assert_eq!(mail.from.as_deref(), Some("Alice Example <alice@example.com>"));
        assert_eq!(mail.to, vec!["bob@example.com", "carol@example.com"]);
        assert_eq!(
            mail.date.unwrap().to_rfc3339(),
            "2025-07-01T10:00:00+00:00"
        );
    }

    #[test]
    fn html_only_message_has_no_text_body() {
        let raw = "Subject: Promo\r\n\
                   Content-Type: text/html; charset=utf-8\r\n\
                   \r\n\
                   <p>Hello <b>world</b></p>\r\n";
        let mail = parse_email(raw.as_bytes()).unwrap();
        assert!(mail.text.is_none());
        assert!(mail.html.as_deref().unwrap().contains("<b>world</b>"));
    }

    #[test]
    fn multipart_alternative_keeps_both_bodies_and_image_attachment() {
        let raw = concat!(
            "Subject: Report\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
            "\r\n",
            "--outer\r\n",
            "Content-Type: multipart/alternative; boundary=\"inner\"\r\n",
            "\r\n",
            "--inner\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "Plain version\r\n",
            "--inner\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>HTML version</p>\r\n",
            "--inner--\r\n",
            "--outer\r\n",
            "Content-Type: image/png\r\n",
            "Content-Disposition: attachment; filename=\"chart.png\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "iVBORw0KGgo=\r\n",
            "--outer--\r\n",
        );
        let mail = parse_email(raw.as_bytes()).unwrap();
        assert!(mail.text.as_deref().unwrap().contains("Plain version"));
        assert!(mail.html.as_deref().unwrap().contains("HTML version"));
        assert_eq!(mail.attachments.len(), 1);
        let attachment = &mail.attachments[0];
        assert_eq!(attachment.content_type, "image/png");
        assert_eq!(attachment.filename.as_deref(), Some("chart.png"));
        assert!(attachment.is_recognizable_image());
        assert!(!attachment.content.is_empty());
    }
}
