// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{anyhow, bail, Context, Result};
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcProtocol {
    Http,
    Https,
    Ws,
    Wss,
}

impl RpcProtocol {
    pub fn is_websocket(&self) -> bool {
        matches!(self, RpcProtocol::Ws | RpcProtocol::Wss)
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, RpcProtocol::Https | RpcProtocol::Wss)
    }
}

/// A node endpoint that can be viewed as either an http or a websocket url
#[derive(Clone, Debug)]
pub struct RpcUrl {
    protocol: RpcProtocol,
    url: Url,
}

impl RpcUrl {
    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url).context("Invalid RPC url")?;
        let protocol = match url.scheme() {
            "http" => RpcProtocol::Http,
            "https" => RpcProtocol::Https,
            "ws" => RpcProtocol::Ws,
            "wss" => RpcProtocol::Wss,
            other => bail!("Unsupported RPC scheme '{other}'. Expected http, https, ws or wss"),
        };
        if url.host_str().is_none() {
            bail!("RPC url must contain a host");
        }
        Ok(Self { protocol, url })
    }

    pub fn protocol(&self) -> RpcProtocol {
        self.protocol
    }

    /// Url usable for plain requests
    pub fn as_http_url(&self) -> Result<String> {
        let scheme = if self.protocol.is_secure() { "https" } else { "http" };
        self.with_scheme(scheme)
    }

    /// Url usable for log subscriptions
    pub fn as_ws_url(&self) -> Result<String> {
        let scheme = if self.protocol.is_secure() { "wss" } else { "ws" };
        self.with_scheme(scheme)
    }

    pub fn is_local(&self) -> bool {
        match self.url.host_str() {
            Some("localhost") | Some("[::1]") => true,
            Some(host) => host.starts_with("127."),
            None => false,
        }
    }

    fn with_scheme(&self, scheme: &str) -> Result<String> {
        if self.url.scheme() == scheme {
            return Ok(self.url.to_string());
        }
        let mut url = self.url.clone();
        url.set_scheme(scheme)
            .map_err(|_| anyhow!("Cannot switch RPC url to {scheme}"))?;
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_conversion() -> Result<()> {
        let rpc = RpcUrl::parse("ws://localhost:8545")?;
        assert_eq!(rpc.protocol(), RpcProtocol::Ws);
        assert_eq!(rpc.as_http_url()?, "http://localhost:8545/");
        assert_eq!(rpc.as_ws_url()?, "ws://localhost:8545/");
        assert!(rpc.is_local());

        let rpc = RpcUrl::parse("https://rpc.example.org/v1")?;
        assert_eq!(rpc.as_ws_url()?, "wss://rpc.example.org/v1");
        assert!(!rpc.is_local());
        Ok(())
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(RpcUrl::parse("ftp://localhost").is_err());
        assert!(RpcUrl::parse("not a url").is_err());
    }
}
