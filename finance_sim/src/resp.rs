use std::fmt::Write as _;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::constant::{CONTENT_TYPE_HTML, NO_CACHE_HEADERS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    SeeOther,
    BadRequest,
    Forbidden,
    NotFound,
    InternalError,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::SeeOther => 303,
            Status::BadRequest => 400,
            Status::Forbidden => 403,
            Status::NotFound => 404,
            Status::InternalError => 500,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::SeeOther => "See Other",
            Status::BadRequest => "Bad Request",
            Status::Forbidden => "Forbidden",
            Status::NotFound => "Not Found",
            Status::InternalError => "Internal Error",
        }
    }
}

#[derive(Debug)]
pub struct Response {
    pub status: Status,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    pub fn html(status: Status, body: String) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), CONTENT_TYPE_HTML.to_string())],
            body,
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            status: Status::SeeOther,
            headers: vec![("Location".to_string(), location.to_string())],
            body: String::new(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Browser-session cookie: no `Max-Age`, gone when the browser closes.
    pub fn set_cookie(self, name: &str, value: &str) -> Self {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", name, value);
        self.header("Set-Cookie", &cookie)
    }

    pub fn clear_cookie(self, name: &str) -> Self {
        let cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name);
        self.header("Set-Cookie", &cookie)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status.code(), self.status.reason());
        for (name, value) in &self.headers {
            let _ = write!(head, "{}: {}\r\n", name, value);
        }
        for (name, value) in NO_CACHE_HEADERS {
            let _ = write!(head, "{}: {}\r\n", name, value);
        }
        let _ = write!(
            head,
            "Content-Length: {}\r\nConnection: close\r\n\r\n",
            self.body.len()
        );
        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(self.body.as_bytes());
        bytes
    }

    pub async fn write_to<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.to_bytes()).await?;
        writer.flush().await
    }
}
