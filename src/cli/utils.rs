use anyhow::{bail, Context, Result};
use reqwest::Method;
use serde_json::Value;

use super::OutputFormat;

/// Thin HTTP client over the API with the success/error envelope unwrapped.
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http: reqwest::Client::new(),
        }
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Value> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str, body: Value) -> Result<Value> {
        self.send(Method::DELETE, path, Some(body)).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .with_context(|| format!("non-JSON response from {url}"))?;

        if !status.is_success() {
            let message = payload
                .get("message")
                .or_else(|| payload.get("error"))
                .and_then(Value::as_str)
                .unwrap_or("request failed");
            bail!("{} ({})", message, status);
        }
        Ok(payload)
    }
}

/// Print an API response in the selected output format.
pub fn print_response(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()));
        }
        OutputFormat::Text => {
            let data = value.get("data").unwrap_or(value);
            print_text(data, 0);
        }
    }
}

fn print_text(value: &Value, indent: usize) {
    let pad = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                match val {
                    Value::Object(_) | Value::Array(_) => {
                        println!("{pad}{key}:");
                        print_text(val, indent + 1);
                    }
                    _ => println!("{pad}{key}: {}", scalar_to_string(val)),
                }
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                println!("{pad}(none)");
            }
            for item in items {
                println!("{pad}-");
                print_text(item, indent + 1);
            }
        }
        other => println!("{pad}{}", scalar_to_string(other)),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
