//! Typed resource paths for the backend REST API.
//!
//! All requests target a path relative to one configured base URL. The
//! builder composes those paths explicitly; there is no dynamic dispatch.

use url::Url;

use crate::codec::Revision;

/// Resource-path builder rooted at the backend base URL.
#[derive(Debug, Clone)]
pub struct Routes {
    base: String,
}

impl Routes {
    /// Validate and normalize the backend endpoint URL.
    pub fn new(endpoint: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(endpoint)?;
        Ok(Self {
            base: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// `GET/POST /blocks/{revision}`
    pub fn block(&self, revision: &Revision) -> String {
        format!("{}/blocks/{revision}", self.base)
    }

    /// `GET/POST /accounts[/{address}]`; no address simulates a deployment.
    pub fn account(&self, address: Option<&str>) -> String {
        match address {
            Some(address) => format!("{}/accounts/{address}", self.base),
            None => format!("{}/accounts", self.base),
        }
    }

    /// `GET /accounts/{address}/storage/{key}`
    pub fn storage(&self, address: &str, key: &str) -> String {
        format!("{}/accounts/{address}/storage/{key}", self.base)
    }

    /// `GET /accounts/{address}/code`
    pub fn code(&self, address: &str) -> String {
        format!("{}/accounts/{address}/code", self.base)
    }

    /// `POST /transactions` (raw submission)
    pub fn transactions(&self) -> String {
        format!("{}/transactions", self.base)
    }

    /// `GET /transactions/{id}`
    pub fn transaction(&self, id: &str) -> String {
        format!("{}/transactions/{id}", self.base)
    }

    /// `GET /transactions/{id}/receipt`
    pub fn receipt(&self, id: &str) -> String {
        format!("{}/transactions/{id}/receipt", self.base)
    }

    /// `POST /transactions/{id}/trace`
    pub fn trace(&self, id: &str) -> String {
        format!("{}/transactions/{id}/trace", self.base)
    }

    /// `POST /events` (log query)
    pub fn events(&self) -> String {
        format!("{}/events", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_compose_from_the_base_url() {
        let routes = Routes::new("http://127.0.0.1:8669/").unwrap();
        assert_eq!(
            routes.block(&Revision::Best),
            "http://127.0.0.1:8669/blocks/best"
        );
        assert_eq!(
            routes.block(&Revision::Number(7)),
            "http://127.0.0.1:8669/blocks/7"
        );
        assert_eq!(
            routes.account(Some("0xabc")),
            "http://127.0.0.1:8669/accounts/0xabc"
        );
        assert_eq!(routes.account(None), "http://127.0.0.1:8669/accounts");
        assert_eq!(
            routes.storage("0xabc", "0x01"),
            "http://127.0.0.1:8669/accounts/0xabc/storage/0x01"
        );
        assert_eq!(routes.code("0xabc"), "http://127.0.0.1:8669/accounts/0xabc/code");
        assert_eq!(
            routes.receipt("0xid"),
            "http://127.0.0.1:8669/transactions/0xid/receipt"
        );
        assert_eq!(routes.events(), "http://127.0.0.1:8669/events");
    }

    #[test]
    fn invalid_endpoints_are_rejected() {
        assert!(Routes::new("not a url").is_err());
    }
}
