//! Integration tests for the mail session.
//!
//! A scripted SMTP server on a loopback listener records each command and
//! the raw message data, so the assembled bytes can be checked exactly.

#![allow(clippy::unwrap_used)]

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use jismail::{
    Error, FixedClock, Mail, MessageOptions, Session, SmtpConfig, Step, SubjectEncoding, send,
};

/// What the fake server saw.
#[derive(Debug, Default)]
struct Transcript {
    commands: Vec<String>,
    data: Vec<Vec<u8>>,
}

/// Starts a one-shot server. `respond` maps each command line to the raw
/// reply; it is called with "." for the end of message data.
async fn spawn_server(respond: fn(&str) -> &'static str) -> (u16, JoinHandle<Transcript>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut reader = BufReader::new(read);
        let mut transcript = Transcript::default();

        write
            .write_all(b"220 fake.example ESMTP ready\r\n")
            .await
            .unwrap();

        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                break;
            }
            let command = line.trim_end().to_string();
            let reply = respond(&command);
            transcript.commands.push(command.clone());
            if write.write_all(reply.as_bytes()).await.is_err() {
                break;
            }

            if reply.starts_with("354") {
                let mut data = Vec::new();
                loop {
                    let mut data_line = Vec::new();
                    if reader.read_until(b'\n', &mut data_line).await.unwrap() == 0 {
                        return transcript;
                    }
                    if data_line == b".\r\n" {
                        break;
                    }
                    data.extend_from_slice(&data_line);
                }
                transcript.data.push(data);
                write.write_all(respond(".").as_bytes()).await.unwrap();
            }

            if command == "QUIT" {
                // Wait for the client to close its side
                let mut rest = String::new();
                while reader.read_line(&mut rest).await.unwrap_or(0) > 0 {}
                break;
            }
        }

        transcript
    });

    (port, handle)
}

fn auth_server(command: &str) -> &'static str {
    match command.split_whitespace().next().unwrap_or("") {
        "EHLO" => "250-fake.example\r\n250-PIPELINING\r\n250-AUTH PLAIN LOGIN\r\n250 8BITMIME\r\n",
        "AUTH" => "235 2.7.0 Authentication successful\r\n",
        "DATA" => "354 End data with <CR><LF>.<CR><LF>\r\n",
        "." => "250 2.0.0 Ok: queued\r\n",
        "QUIT" => "221 2.0.0 Bye\r\n",
        _ => "250 2.1.0 Ok\r\n",
    }
}

fn open_server(command: &str) -> &'static str {
    if command.starts_with("EHLO") {
        "250-fake.example\r\n250 8BITMIME\r\n"
    } else {
        auth_server(command)
    }
}

fn clock() -> FixedClock {
    FixedClock::parse("2024-03-09T08:00:00+09:00").unwrap()
}

fn japanese_mail() -> Mail {
    Mail::new(
        "ほげ <sender@example.org>",
        "receipt@example.org",
        "テスト",
        "テスト本文",
    )
}

const JAPANESE_MESSAGE: &[u8] = concat!(
    "From:  =?ISO-2022-JP?B?GyRCJFskMhsoQiA=?=\r\n <sender@example.org>\r\n",
    "To: receipt@example.org\r\n",
    "Subject: =?ISO-2022-JP?B?GyRCJUYlOSVIGyhC?=\r\n",
    "Date: Sat, 09 Mar 2024 08:00:00 +0900\r\n",
    "MIME-Version: 1.0\r\n",
    "Content-Type: text/plain; charset=ISO-2022-JP\r\n",
    "Content-Transfer-Encoding: 7bit\r\n",
    "\r\n",
    "\x1b$B%F%9%HK\\J8\x1b(B\r\n",
)
.as_bytes();

#[tokio::test]
async fn test_send_japanese_mail_with_auth() {
    let (port, server) = spawn_server(auth_server).await;
    let config = SmtpConfig::new("127.0.0.1", port).with_credentials("user", "secret");

    let mut session = Session::connect(&config).await.unwrap().with_clock(clock());
    assert!(session.server_info().unwrap().authenticated);
    session.send_mail(&japanese_mail()).await.unwrap();
    assert!(session.is_open());
    session.quit().await.unwrap();

    let transcript = server.await.unwrap();
    assert_eq!(
        transcript.commands,
        vec![
            "EHLO localhost",
            "AUTH PLAIN AHVzZXIAc2VjcmV0",
            "RSET",
            "MAIL FROM:<sender@example.org>",
            "RCPT TO:<receipt@example.org>",
            "DATA",
            "QUIT",
        ]
    );
    assert_eq!(transcript.data, vec![JAPANESE_MESSAGE.to_vec()]);
}

#[tokio::test]
async fn test_no_auth_without_username() {
    let (port, server) = spawn_server(auth_server).await;
    let config = SmtpConfig::new("127.0.0.1", port);

    let mut session = Session::connect(&config).await.unwrap().with_clock(clock());
    assert!(!session.server_info().unwrap().authenticated);
    session.send_mail(&japanese_mail()).await.unwrap();
    session.quit().await.unwrap();

    let transcript = server.await.unwrap();
    assert!(!transcript.commands.iter().any(|c| c.starts_with("AUTH")));
}

#[tokio::test]
async fn test_no_auth_when_not_advertised() {
    let (port, server) = spawn_server(open_server).await;
    let config = SmtpConfig::new("127.0.0.1", port).with_credentials("user", "secret");

    let session = Session::connect(&config).await.unwrap();
    assert!(!session.server_info().unwrap().authenticated);
    session.quit().await.unwrap();

    let transcript = server.await.unwrap();
    assert_eq!(transcript.commands, vec!["EHLO localhost", "QUIT"]);
}

#[tokio::test]
async fn test_auth_without_plain_mechanism() {
    fn server(command: &str) -> &'static str {
        if command.starts_with("EHLO") {
            "250-fake.example\r\n250 AUTH CRAM-MD5\r\n"
        } else {
            auth_server(command)
        }
    }

    let (port, _server) = spawn_server(server).await;
    let config = SmtpConfig::new("127.0.0.1", port).with_credentials("user", "secret");

    let err = Session::connect(&config).await.unwrap_err();
    assert_eq!(err.step(), Some(Step::Auth));
}

#[tokio::test]
async fn test_ascii_mail_exact_bytes() {
    let (port, server) = spawn_server(open_server).await;
    let config = SmtpConfig::new("127.0.0.1", port).with_helo_name("client.test");
    let mail = Mail::new("sender@example.org", "receipt@example.org", "hi", ".hidden");

    let mut session = Session::connect(&config).await.unwrap().with_clock(clock());
    session.send_mail(&mail).await.unwrap();
    session.quit().await.unwrap();

    let transcript = server.await.unwrap();
    assert_eq!(transcript.commands[0], "EHLO client.test");
    let expected = concat!(
        "From: sender@example.org\r\n",
        "To: receipt@example.org\r\n",
        "Subject: =?ISO-2022-JP?B?aGk=?=\r\n",
        "Date: Sat, 09 Mar 2024 08:00:00 +0900\r\n",
        "MIME-Version: 1.0\r\n",
        "Content-Type: text/plain; charset=ISO-2022-JP\r\n",
        "Content-Transfer-Encoding: 7bit\r\n",
        "\r\n",
        // Dot-stuffed on the wire
        "..hidden\r\n",
    );
    assert_eq!(transcript.data, vec![expected.as_bytes().to_vec()]);
}

#[tokio::test]
async fn test_plain_ascii_subject_option() {
    let (port, server) = spawn_server(open_server).await;
    let config = SmtpConfig::new("127.0.0.1", port);
    let mail = Mail::new("sender@example.org", "receipt@example.org", "hello", "x");
    let options = MessageOptions {
        subject: SubjectEncoding::WhenNeeded,
    };

    let mut session = Session::connect(&config)
        .await
        .unwrap()
        .with_clock(clock())
        .with_options(options);
    session.send_mail(&mail).await.unwrap();
    session.quit().await.unwrap();

    let transcript = server.await.unwrap();
    let data = String::from_utf8(transcript.data[0].clone()).unwrap();
    assert!(data.contains("\r\nSubject: hello\r\n"));
}

#[tokio::test]
async fn test_encoding_failure_sends_nothing() {
    let (port, server) = spawn_server(open_server).await;
    let config = SmtpConfig::new("127.0.0.1", port);

    let mut session = Session::connect(&config).await.unwrap().with_clock(clock());
    let mail = Mail::new("sender@example.org", "receipt@example.org", "件名 😀", "本文");
    let err = session.send_mail(&mail).await.unwrap_err();

    match &err {
        Error::Encoding(inner) => {
            assert_eq!(inner.field(), Some(jismail::mime::Field::Subject));
            assert_eq!(inner.unmappable(), Some(('😀', 3)));
        }
        other => panic!("expected encoding error, got {other:?}"),
    }

    // Nothing reached the server and the session is still usable
    assert!(session.is_open());
    session.send_mail(&japanese_mail()).await.unwrap();
    session.quit().await.unwrap();

    let transcript = server.await.unwrap();
    assert_eq!(
        transcript.commands,
        vec![
            "EHLO localhost",
            "RSET",
            "MAIL FROM:<sender@example.org>",
            "RCPT TO:<receipt@example.org>",
            "DATA",
            "QUIT",
        ]
    );
    assert_eq!(transcript.data.len(), 1);
}

#[tokio::test]
async fn test_body_encoding_failure() {
    let (port, _server) = spawn_server(open_server).await;
    let config = SmtpConfig::new("127.0.0.1", port);

    let mut session = Session::connect(&config).await.unwrap();
    let mail = Mail::new("sender@example.org", "receipt@example.org", "件名", "안녕");
    let err = session.send_mail(&mail).await.unwrap_err();

    assert!(matches!(err, Error::Encoding(_)));
    assert!(session.is_open());
}

#[tokio::test]
async fn test_rejected_recipient_closes_session() {
    fn server(command: &str) -> &'static str {
        if command.starts_with("RCPT") {
            "550 5.1.1 No such user\r\n"
        } else {
            open_server(command)
        }
    }

    let (port, server) = spawn_server(server).await;
    let config = SmtpConfig::new("127.0.0.1", port);

    let mut session = Session::connect(&config).await.unwrap();
    let err = session.send_mail(&japanese_mail()).await.unwrap_err();
    assert_eq!(err.step(), Some(Step::RcptTo));
    assert_eq!(err.smtp_code(), Some(550));
    assert!(!session.is_open());

    let err = session.send_mail(&japanese_mail()).await.unwrap_err();
    assert!(matches!(err, Error::SessionClosed));
    assert!(matches!(session.quit().await, Err(Error::SessionClosed)));

    let transcript = server.await.unwrap();
    assert!(transcript.data.is_empty());
    assert!(!transcript.commands.contains(&"DATA".to_string()));
}

#[tokio::test]
async fn test_invalid_recipient_keeps_session() {
    let (port, server) = spawn_server(open_server).await;
    let config = SmtpConfig::new("127.0.0.1", port);

    let mut session = Session::connect(&config).await.unwrap();
    let mail = Mail::new("sender@example.org", "not an address", "件名", "本文");
    let err = session.send_mail(&mail).await.unwrap_err();

    assert_eq!(err.step(), Some(Step::RcptTo));
    assert_eq!(err.smtp_code(), None);
    assert!(session.is_open());
    session.quit().await.unwrap();

    let transcript = server.await.unwrap();
    assert_eq!(transcript.commands, vec!["EHLO localhost", "QUIT"]);
}

#[tokio::test]
async fn test_oversized_message_left_to_server() {
    fn server(command: &str) -> &'static str {
        if command.starts_with("EHLO") {
            "250-fake.example\r\n250 SIZE 64\r\n"
        } else {
            open_server(command)
        }
    }

    let (port, server) = spawn_server(server).await;
    let config = SmtpConfig::new("127.0.0.1", port);

    let mut session = Session::connect(&config).await.unwrap().with_clock(clock());
    assert_eq!(
        session.server_info().unwrap().max_message_size(),
        Some(64)
    );
    session.send_mail(&japanese_mail()).await.unwrap();
    session.quit().await.unwrap();

    let transcript = server.await.unwrap();
    assert_eq!(transcript.data.len(), 1);
    assert!(transcript.data[0].len() > 64);
}

#[tokio::test]
async fn test_halfwidth_katakana_sent_as_jis_x0201() {
    let (port, server) = spawn_server(open_server).await;
    let config = SmtpConfig::new("127.0.0.1", port);

    let mut session = Session::connect(&config).await.unwrap().with_clock(clock());
    let mail = Mail::new("sender@example.org", "receipt@example.org", "件名", "ｱｲｳ");
    session.send_mail(&mail).await.unwrap();

    let err = session
        .send_mail(&Mail::new("sender@example.org", "receipt@example.org", "1\u{2212}2", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Encoding(_)));
    assert!(session.is_open());
    session.quit().await.unwrap();

    let transcript = server.await.unwrap();
    assert_eq!(transcript.data.len(), 1);
    assert!(transcript.data[0].ends_with(b"\r\n\r\n\x1b(I123\x1b(B\r\n"));
}

#[tokio::test]
async fn test_one_shot_send() {
    let (port, server) = spawn_server(open_server).await;
    let config = SmtpConfig::new("127.0.0.1", port);

    send(&config, &japanese_mail()).await.unwrap();

    let transcript = server.await.unwrap();
    assert_eq!(transcript.commands.last().unwrap(), "QUIT");
    assert_eq!(transcript.data.len(), 1);
}

#[tokio::test]
async fn test_connect_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = Session::connect(&SmtpConfig::new("127.0.0.1", port))
        .await
        .unwrap_err();
    assert_eq!(err.step(), Some(Step::Connect));
}

#[tokio::test]
async fn test_invalid_config() {
    let err = Session::connect(&SmtpConfig::new("", 25)).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
