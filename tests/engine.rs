//! Full pipeline against loopback FTP and SMTP stubs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sounder::discovery::resolve_targets;
use sounder::{
    AttackMode, AttemptScheduler, CredentialSource, EngineConfig, Finding, Port, Protocol,
    ResultStore, ServiceLabel,
};
use sounder::timing::TimingConfig;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

async fn line(reader: &mut (impl AsyncBufReadExt + Unpin)) -> Option<String> {
    let mut buf = String::new();
    match reader.read_line(&mut buf).await {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim_end().to_string()),
    }
}

async fn ftp_stub(user: &'static str, pass: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (read, mut write) = socket.into_split();
                let mut reader = BufReader::new(read);
                let _ = write.write_all(b"220 lab FTP server\r\n").await;
                let Some(u) = line(&mut reader).await else { return };
                let _ = write.write_all(b"331 Password required\r\n").await;
                let Some(p) = line(&mut reader).await else { return };
                let ok = u == format!("USER {}", user) && p == format!("PASS {}", pass);
                let reply: &[u8] = if ok { b"230 Welcome\r\n" } else { b"530 Denied\r\n" };
                let _ = write.write_all(reply).await;
            });
        }
    });
    addr
}

async fn smtp_stub(user: &'static str, pass: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (read, mut write) = socket.into_split();
                let mut reader = BufReader::new(read);
                let _ = write.write_all(b"220 lab ESMTP\r\n").await;
                if line(&mut reader).await.is_none() {
                    return;
                }
                let _ = write.write_all(b"250-lab\r\n250 AUTH LOGIN\r\n").await;
                if line(&mut reader).await.is_none() {
                    return;
                }
                let _ = write.write_all(b"334 VXNlcm5hbWU6\r\n").await;
                let Some(u) = line(&mut reader).await else { return };
                let _ = write.write_all(b"334 UGFzc3dvcmQ6\r\n").await;
                let Some(p) = line(&mut reader).await else { return };
                let ok = u == STANDARD.encode(user) && p == STANDARD.encode(pass);
                let reply: &[u8] = if ok { b"235 OK\r\n" } else { b"535 Denied\r\n" };
                let _ = write.write_all(reply).await;
            });
        }
    });
    addr
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn lab_config(attack_mode: AttackMode) -> EngineConfig {
    EngineConfig {
        timeout_ms: 1000,
        banner_timeout_ms: 500,
        concurrency: 8,
        attack_mode,
        timing: TimingConfig::immediate(),
        ..EngineConfig::default()
    }
}

fn port(raw: u16) -> Port {
    Port::new(raw).unwrap()
}

#[tokio::test]
async fn test_full_run_finds_both_logins() {
    let ftp = ftp_stub("admin", "secret").await;
    let smtp = smtp_stub("root", "toor").await;
    let closed = closed_port().await;

    let config = lab_config(AttackMode::Exhaustive);
    let targets = resolve_targets(&["127.0.0.1"], &config, false).await.unwrap();
    let ports = vec![port(ftp.port()), port(smtp.port()), port(closed)];
    let credentials = CredentialSource::new(["admin", "root"], ["secret", "toor", "123456"]);

    let store = ResultStore::new();
    let scheduler = AttemptScheduler::new(config, store.clone()).unwrap();
    let report = scheduler.run(&targets, &ports, &credentials).await;

    assert_eq!(report.stats.ports_probed, 3);
    assert_eq!(report.stats.open_ports, 2);
    assert_eq!(report.stats.attempts, 2 * 2 * 3);
    assert_eq!(report.stats.valid_credentials, 2);

    let ftp_probe = report
        .probes
        .iter()
        .find(|p| p.port().as_u16() == ftp.port())
        .unwrap();
    assert_eq!(ftp_probe.service(), Some(ServiceLabel::Ftp));
    assert_eq!(ftp_probe.banner(), Some("220 lab FTP server"));

    let mut found: Vec<(Protocol, String, String)> = report
        .credentials
        .iter()
        .map(|r| {
            (
                r.protocol,
                r.credential.username().to_string(),
                r.credential.password().to_string(),
            )
        })
        .collect();
    found.sort_by_key(|(protocol, _, _)| protocol.to_string());
    assert_eq!(
        found,
        vec![
            (Protocol::Ftp, "admin".to_string(), "secret".to_string()),
            (Protocol::Smtp, "root".to_string(), "toor".to_string()),
        ]
    );
    assert!(report.credentials.iter().all(|r| r.technique == "exhaustive/steady"));

    // Two open ports and two credentials, nothing else.
    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 4);
    assert_eq!(
        snapshot
            .iter()
            .filter(|f| matches!(f, Finding::ValidCredential(_)))
            .count(),
        2
    );
}

#[tokio::test]
async fn test_spray_attack_without_probing() {
    let ftp = ftp_stub("guest", "welcome").await;

    let config = lab_config(AttackMode::Spray);
    let targets = resolve_targets(&["127.0.0.1"], &config, false).await.unwrap();
    let credentials = CredentialSource::new(
        ["admin", "guest", "ftp"],
        ["123456", "password", "welcome", "letmein", "qwerty", "dragon"],
    );

    let scheduler = AttemptScheduler::new(config, ResultStore::new()).unwrap();
    let report = scheduler
        .run_attack(&targets, Protocol::Ftp, port(ftp.port()), &credentials)
        .await;

    assert_eq!(report.stats.attempts, 5 * 3);
    assert_eq!(report.stats.valid_credentials, 1);
    assert_eq!(report.credentials[0].credential.username(), "guest");
    assert_eq!(report.technique, "spray/steady");

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["stats"]["attempts"], 15);
    assert_eq!(json["credentials"][0]["protocol"], "ftp");
}

#[tokio::test]
async fn test_unreachable_service_yields_no_findings() {
    let closed = closed_port().await;

    let config = lab_config(AttackMode::Exhaustive);
    let targets = resolve_targets(&["127.0.0.1"], &config, false).await.unwrap();

    let scheduler = AttemptScheduler::new(config, ResultStore::new()).unwrap();
    let report = scheduler
        .run_attack(&targets, Protocol::Smtp, port(closed), &CredentialSource::builtin())
        .await;

    assert_eq!(report.stats.attempts, 25);
    assert_eq!(report.stats.valid_credentials, 0);
    assert!(scheduler.store().is_empty());
}
