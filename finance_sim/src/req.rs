use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GET,
    POST,
}

impl TryFrom<&str> for Method {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, anyhow::Error> {
        match value {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            _ => Err(anyhow!("Method not supported")),
        }
    }
}

#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl Request {
    /// Reads one request: the head up to the blank line, then `Content-Length`
    /// bytes of body. Anything over `max_bytes` in total is refused.
    pub async fn new<Reader: AsyncRead + Unpin>(mut reader: Reader, max_bytes: usize) -> Result<Self> {
        let mut raw: Vec<u8> = Vec::with_capacity(1024);
        let mut chunk = [0; 1024];
        let mut scanned = 0;

        let head_end = loop {
            if let Some(pos) = find_head_end(&raw[scanned..]) {
                break scanned + pos;
            }
            scanned = raw.len().saturating_sub(3);
            let budget = max_bytes.saturating_sub(raw.len()).min(chunk.len());
            if budget == 0 {
                return Err(anyhow!("Request too large"));
            }
            let size = reader
                .read(&mut chunk[..budget])
                .await
                .context("Failed to read stream")?;
            if size == 0 {
                return Err(anyhow!("Connection closed before end of headers"));
            }
            raw.extend_from_slice(&chunk[..size]);
        };

        let head = String::from_utf8_lossy(&raw[..head_end]).to_string();
        let mut head_lines = head.lines();
        let first = head_lines.next().context("Empty Request")?;
        let mut request_parts = first.split_whitespace();
        let method: Method = request_parts
            .next()
            .ok_or(anyhow!("missing method"))
            .and_then(TryInto::try_into)
            .context("Missing Method")?;
        let url = request_parts.next().context("No Path")?;
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (url.to_string(), None),
        };

        // Headers
        let mut headers = HashMap::new();
        for line in head_lines {
            if let Some((k, v)) = line.split_once(':') {
                headers.insert(k.trim().to_lowercase(), v.trim().to_string());
            }
        }

        // Body
        let content_length = match headers.get("content-length") {
            Some(len) => len.parse::<usize>().context("Invalid Content-Length")?,
            None => 0,
        };
        let body_start = head_end + 4;
        body_start
            .checked_add(content_length)
            .filter(|total| *total <= max_bytes)
            .context("Request too large")?;
        let mut body = raw[body_start..].to_vec();
        while body.len() < content_length {
            let want = (content_length - body.len()).min(chunk.len());
            let size = reader
                .read(&mut chunk[..want])
                .await
                .context("Failed to read body")?;
            if size == 0 {
                return Err(anyhow!("Connection closed before end of body"));
            }
            body.extend_from_slice(&chunk[..size]);
        }
        body.truncate(content_length);

        Ok(Request {
            method,
            path,
            query,
            headers,
            body: String::from_utf8_lossy(&body).to_string(),
        })
    }

    /// Decodes an `application/x-www-form-urlencoded` body.
    pub fn form<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_urlencoded::from_str(&self.body)
            .map_err(|e| AppError::validation(format!("malformed form: {}", e)))
    }

    pub fn query<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_urlencoded::from_str(self.query.as_deref().unwrap_or(""))
            .map_err(|e| AppError::validation(format!("malformed query: {}", e)))
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers.get("cookie").and_then(|raw| {
            raw.split(';').find_map(|pair| {
                let (k, v) = pair.trim().split_once('=')?;
                (k == name).then_some(v)
            })
        })
    }
}

fn find_head_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n")
}
