//! Shared test utilities for `ouderraad`.
//!
//! Helpers for in-memory databases, fixture entities, a fake content sink and
//! a throwaway HTTP server for the CMS clients.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::{
    core::{
        cms::ContentSink,
        sponsors::Sponsor,
        users::{self, Role},
    },
    entities,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde_json::{Map, Value};
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all database tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Installs a test-writer tracing subscriber. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

/// Creates a user through the normal code path, with `test@setup` as actor.
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
    name: &str,
    role: Role,
) -> Result<entities::user::Model> {
    users::create_user(db, "test@setup", email, name, role).await
}

/// `count` sponsors with ids `s0`, `s1`, ...
pub fn sample_sponsors(count: usize) -> Vec<Sponsor> {
    (0..count)
        .map(|i| Sponsor {
            id: format!("s{i}"),
            name: format!("Sponsor {i}"),
            logo: Some(format!("https://cdn.example.org/logo-{i}.png")),
            website: Some(format!("https://sponsor{i}.example.org")),
        })
        .collect()
}

/// Content sink that records writes and can be told to fail for one id.
#[derive(Debug, Default)]
pub struct RecordingSink {
    fail_id: Option<String>,
    creates: Mutex<Vec<(String, Map<String, Value>)>>,
    updates: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    /// Sink that fails every write touching entry `id`.
    pub fn failing_on(id: &str) -> Self {
        Self {
            fail_id: Some(id.to_string()),
            ..Self::default()
        }
    }

    /// `(type, data)` of every successful create.
    pub fn creates(&self) -> Vec<(String, Map<String, Value>)> {
        self.creates.lock().unwrap().clone()
    }

    /// `(type, id)` of every successful update.
    pub fn updates(&self) -> Vec<(String, String)> {
        self.updates.lock().unwrap().clone()
    }

    fn check(&self, id: Option<&str>, data: &Map<String, Value>) -> Result<()> {
        let Some(fail_id) = self.fail_id.as_deref() else {
            return Ok(());
        };
        // Creates carry no id, so new entries are matched on a `data.slug` marker.
        let hit =
            id == Some(fail_id) || data.get("slug").and_then(Value::as_str) == Some(fail_id);
        if hit {
            return Err(Error::Api {
                status: 500,
                message: format!("refused {fail_id}"),
            });
        }
        Ok(())
    }
}

impl ContentSink for RecordingSink {
    async fn create(
        &self,
        content_type: &str,
        data: &Map<String, Value>,
        _publish: bool,
    ) -> Result<()> {
        self.check(None, data)?;
        self.creates
            .lock()
            .unwrap()
            .push((content_type.to_string(), data.clone()));
        Ok(())
    }

    async fn update(
        &self,
        content_type: &str,
        id: &str,
        data: &Map<String, Value>,
        _publish: bool,
    ) -> Result<()> {
        self.check(Some(id), data)?;
        self.updates
            .lock()
            .unwrap()
            .push((content_type.to_string(), id.to_string()));
        Ok(())
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Serves exactly one HTTP response on a random local port.
///
/// Returns the base URL (`http://127.0.0.1:<port>`) and a handle resolving to
/// the raw request that was received, headers and body included.
pub async fn serve_once(status: u16, body: &str) -> Result<(String, JoinHandle<String>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base = format!("http://{}", listener.local_addr()?);
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return String::new();
        };
        let raw = read_request(&mut socket).await;
        let response = format!(
            concat!(
                "HTTP/1.1 {} {}\r\n",
                "content-type: application/json\r\n",
                "content-length: {}\r\n",
                "connection: close\r\n\r\n",
                "{}",
            ),
            status,
            status_text(status),
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
        raw
    });
    Ok((base, handle))
}

/// Accepts connections but never answers, for timeout tests.
pub async fn serve_silent() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });
    Ok(base)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let Ok(n) = socket.read(&mut chunk).await else {
            break;
        };
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if request_complete(&buf) {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn request_complete(buf: &[u8]) -> bool {
    let text = String::from_utf8_lossy(buf);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    buf.len() >= header_end + 4 + content_length
}
