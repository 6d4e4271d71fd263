//! Delivery through a recording transport.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use chrono::{FixedOffset, TimeZone};

use mailforge_core::{Envelope, Error, Secrets, Transport, TransportError, send_file, send_message};
use mailforge_mime::{Address, Message};

/// Transport that records every delivery and optionally fails.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(Envelope, Vec<u8>)>>,
    failure: Option<TransportError>,
}

impl RecordingTransport {
    fn failing(error: TransportError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    fn deliveries(&self) -> Vec<(Envelope, Vec<u8>)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    fn send(
        &self,
        _secrets: &Secrets,
        envelope: &Envelope,
        message: &[u8],
    ) -> Result<(), TransportError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.sent
            .lock()
            .unwrap()
            .push((envelope.clone(), message.to_vec()));
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("mailforge_core=debug,mailforge_mime=debug")
        .with_test_writer()
        .try_init();
}

fn secrets() -> Secrets {
    Secrets::from_json(
        r#"{
            "SmtpHost": "smtp.example.com",
            "SmtpUser": "relay@example.com",
            "SmtpPass": "secret",
            "From": {"Name": "Z", "Address": "z@example.com"},
            "Headers": {"reply-to": "list@example.com", "X-Mailer": "mailforge"}
        }"#,
    )
    .unwrap()
}

fn message() -> Message {
    let date = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2022, 1, 1, 0, 0, 0)
        .unwrap();
    Message::new(Address::new("Z", "z@example.com"), "status")
        .date(date)
        .to(Address::new("A", "a@example.com"))
        .cc(Address::new("C", "c@example.com"))
        .bcc(Address::new("B", "b@example.com"))
        .header("Reply-To", "me@example.com")
        .content("All good.")
}

#[test]
fn test_send_message() {
    init_tracing();
    let transport = RecordingTransport::default();
    send_message(&transport, &secrets(), &message()).unwrap();

    let deliveries = transport.deliveries();
    assert_eq!(deliveries.len(), 1);
    let (envelope, bytes) = &deliveries[0];
    assert_eq!(envelope.sender, "relay@example.com");
    assert_eq!(
        envelope.recipients,
        ["a@example.com", "c@example.com", "b@example.com"]
    );

    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(text.contains("\r\nReply-To: me@example.com\r\n"));
    assert!(text.contains("\r\nX-Mailer: mailforge\r\n"));
    assert!(!text.contains("list@example.com"));
    assert!(!text.contains("b@example.com"));

    let decoded = Message::parse(bytes).unwrap();
    assert_eq!(decoded.content, "All good.");
    assert_eq!(decoded.headers["X-Mailer"], "mailforge");
}

#[test]
fn test_send_message_without_recipients() {
    let transport = RecordingTransport::default();
    let message = Message::new(Address::bare("z@example.com"), "nobody").content("x");
    let err = send_message(&transport, &secrets(), &message).unwrap_err();

    assert!(matches!(err, Error::NoRecipients));
    assert!(transport.deliveries().is_empty());
}

#[test]
fn test_send_message_transport_failure() {
    init_tracing();
    let transport =
        RecordingTransport::failing(TransportError::Authentication("535 bad credentials".into()));
    let err = send_message(&transport, &secrets(), &message()).unwrap_err();

    match err {
        Error::Transport(e) => assert!(!e.is_transient()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_send_file() {
    init_tracing();
    let path = std::env::temp_dir().join(format!("mailforge-report-{}.csv", std::process::id()));
    std::fs::write(&path, "a,b\n1,2\n").unwrap();

    let transport = RecordingTransport::default();
    let result = send_file(
        &transport,
        &secrets(),
        Address::new("A", "a@example.com"),
        &path,
        "text/csv",
    );
    std::fs::remove_file(&path).unwrap();
    result.unwrap();

    let deliveries = transport.deliveries();
    let (envelope, bytes) = &deliveries[0];
    assert_eq!(envelope.recipients, ["a@example.com"]);

    let decoded = Message::parse(bytes).unwrap();
    let file_name = path.file_name().unwrap().to_str().unwrap();
    assert_eq!(decoded.subject, file_name);
    assert_eq!(decoded.from, Address::new("Z", "z@example.com"));
    assert_eq!(decoded.content, "☺");
    assert_eq!(decoded.attachments.len(), 1);

    let attachment = &decoded.attachments[0];
    assert_eq!(attachment.filename.as_deref(), Some(file_name));
    assert_eq!(attachment.content_type.as_deref(), Some("text/csv"));
    assert_eq!(attachment.data, b"a,b\n1,2\n");
}

#[test]
fn test_send_missing_file() {
    let transport = RecordingTransport::default();
    let err = send_file(
        &transport,
        &secrets(),
        Address::bare("a@example.com"),
        "/nonexistent/mailforge/file.txt",
        "",
    )
    .unwrap_err();

    assert!(matches!(err, Error::Mime(_)));
    assert!(transport.deliveries().is_empty());
}
