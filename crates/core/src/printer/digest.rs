//! HTTP Digest access authentication (RFC 7616, with RFC 2617 fallback).

use once_cell::sync::Lazy;
use regex_lite::Regex;
use sha2::{Digest, Sha256};

use super::PrinterError;

/// `key=value` or `key="quoted value"` pairs inside a challenge.
static PARAM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z0-9_-]+)\s*=\s*(?:"((?:[^"\\]|\\.)*)"|([^\s,]+))"#)
        .expect("digest parameter regex is valid")
});

/// Hash algorithm negotiated in a digest challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Md5,
    Md5Sess,
    Sha256,
    Sha256Sess,
}

impl DigestAlgorithm {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MD5" => Some(DigestAlgorithm::Md5),
            "MD5-SESS" => Some(DigestAlgorithm::Md5Sess),
            "SHA-256" => Some(DigestAlgorithm::Sha256),
            "SHA-256-SESS" => Some(DigestAlgorithm::Sha256Sess),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Md5Sess => "MD5-sess",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha256Sess => "SHA-256-sess",
        }
    }

    fn is_session(&self) -> bool {
        matches!(self, DigestAlgorithm::Md5Sess | DigestAlgorithm::Sha256Sess)
    }

    fn hash(&self, data: &str) -> String {
        match self {
            DigestAlgorithm::Md5 | DigestAlgorithm::Md5Sess => {
                format!("{:x}", md5::compute(data.as_bytes()))
            }
            DigestAlgorithm::Sha256 | DigestAlgorithm::Sha256Sess => {
                format!("{:x}", Sha256::digest(data.as_bytes()))
            }
        }
    }
}

/// A parsed `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    pub algorithm: DigestAlgorithm,
    /// `Some("auth")` when the server offers it, `None` for legacy RFC 2069 servers.
    pub qop: Option<String>,
    /// The server rejected a previous nonce as stale, not the credentials.
    pub stale: bool,
}

/// Inputs for one `Authorization` header.
#[derive(Debug, Clone)]
pub struct DigestRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub method: &'a str,
    pub uri: &'a str,
    pub nc: u32,
    pub cnonce: &'a str,
}

impl DigestChallenge {
    /// Parse a `WWW-Authenticate` header value.
    pub fn parse(header: &str) -> Result<Self, PrinterError> {
        let header = header.trim();
        let params = match header.split_once(char::is_whitespace) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("digest") => rest,
            _ => {
                return Err(PrinterError::AuthenticationFailed(format!(
                    "unsupported auth scheme: {}",
                    header.chars().take(40).collect::<String>()
                )))
            }
        };

        let mut realm = None;
        let mut nonce = None;
        let mut opaque = None;
        let mut algorithm = DigestAlgorithm::Md5;
        let mut qop_options = None;
        let mut stale = false;

        for caps in PARAM_RE.captures_iter(params) {
            let key = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().replace("\\\"", "\""))
                .unwrap_or_default();

            match key.as_str() {
                "realm" => realm = Some(value),
                "nonce" => nonce = Some(value),
                "opaque" => opaque = Some(value),
                "qop" => qop_options = Some(value),
                "stale" => stale = value.eq_ignore_ascii_case("true"),
                "algorithm" => {
                    algorithm = DigestAlgorithm::parse(&value).ok_or_else(|| {
                        PrinterError::AuthenticationFailed(format!(
                            "unsupported digest algorithm: {}",
                            value
                        ))
                    })?;
                }
                _ => {}
            }
        }

        let qop = match qop_options {
            None => None,
            Some(options) => {
                if options.split(',').any(|q| q.trim().eq_ignore_ascii_case("auth")) {
                    Some("auth".to_string())
                } else {
                    return Err(PrinterError::AuthenticationFailed(format!(
                        "unsupported digest qop: {}",
                        options
                    )));
                }
            }
        };

        Ok(Self {
            realm: realm.ok_or_else(|| {
                PrinterError::AuthenticationFailed("digest challenge without realm".to_string())
            })?,
            nonce: nonce.ok_or_else(|| {
                PrinterError::AuthenticationFailed("digest challenge without nonce".to_string())
            })?,
            opaque,
            algorithm,
            qop,
            stale,
        })
    }

    /// Compute the `response` field for a request.
    pub fn response(&self, req: &DigestRequest<'_>) -> String {
        let alg = self.algorithm;
        let mut ha1 = alg.hash(&format!("{}:{}:{}", req.username, self.realm, req.password));
        if alg.is_session() {
            ha1 = alg.hash(&format!("{}:{}:{}", ha1, self.nonce, req.cnonce));
        }
        let ha2 = alg.hash(&format!("{}:{}", req.method, req.uri));

        match &self.qop {
            Some(qop) => alg.hash(&format!(
                "{}:{}:{:08x}:{}:{}:{}",
                ha1, self.nonce, req.nc, req.cnonce, qop, ha2
            )),
            None => alg.hash(&format!("{}:{}:{}", ha1, self.nonce, ha2)),
        }
    }

    /// Build the full `Authorization` header value.
    pub fn authorization(&self, req: &DigestRequest<'_>) -> String {
        let mut header = format!(
            r#"Digest username="{}", realm="{}", nonce="{}", uri="{}", algorithm={}, response="{}""#,
            quote(req.username),
            quote(&self.realm),
            quote(&self.nonce),
            quote(req.uri),
            self.algorithm.as_str(),
            self.response(req),
        );
        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(r#", opaque="{}""#, quote(opaque)));
        }
        if let Some(qop) = &self.qop {
            header.push_str(&format!(
                r#", qop={}, nc={:08x}, cnonce="{}""#,
                qop,
                req.nc,
                quote(req.cnonce)
            ));
        }
        header
    }
}

fn quote(s: &str) -> String {
    s.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prusalink_challenge() {
        let header = r#"Digest realm="Printer API", nonce="dca577670000207b", algorithm=MD5, qop="auth""#;
        let challenge = DigestChallenge::parse(header).unwrap();
        assert_eq!(challenge.realm, "Printer API");
        assert_eq!(challenge.nonce, "dca577670000207b");
        assert_eq!(challenge.algorithm, DigestAlgorithm::Md5);
        assert_eq!(challenge.qop.as_deref(), Some("auth"));
        assert!(challenge.opaque.is_none());
        assert!(!challenge.stale);
    }

    #[test]
    fn test_parse_picks_auth_from_qop_list() {
        let header = r#"Digest realm="r", qop="auth-int, auth", nonce="n", stale=TRUE, opaque="o""#;
        let challenge = DigestChallenge::parse(header).unwrap();
        assert_eq!(challenge.qop.as_deref(), Some("auth"));
        assert_eq!(challenge.opaque.as_deref(), Some("o"));
        assert!(challenge.stale);
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        let err = DigestChallenge::parse(r#"Basic realm="x""#).unwrap_err();
        assert!(matches!(err, PrinterError::AuthenticationFailed(_)));
    }

    #[test]
    fn test_parse_rejects_missing_nonce() {
        assert!(DigestChallenge::parse(r#"Digest realm="x""#).is_err());
    }

    #[test]
    fn test_parse_rejects_auth_int_only() {
        assert!(DigestChallenge::parse(r#"Digest realm="x", nonce="n", qop="auth-int""#).is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_algorithm() {
        assert!(DigestChallenge::parse(r#"Digest realm="x", nonce="n", algorithm=SHA-512"#).is_err());
    }

    #[test]
    fn test_rfc2617_md5_response() {
        let challenge = DigestChallenge::parse(
            r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#,
        )
        .unwrap();
        let req = DigestRequest {
            username: "Mufasa",
            password: "Circle Of Life",
            method: "GET",
            uri: "/dir/index.html",
            nc: 1,
            cnonce: "0a4f113b",
        };
        assert_eq!(challenge.response(&req), "6629fae49393a05397450978507c4ef1");
    }

    #[test]
    fn test_rfc7616_md5_and_sha256_responses() {
        let base = r#"realm="http-auth@example.org", qop="auth, auth-int", nonce="7ypf/xlj9XXwfDPEoM4URrv/xwf94BcCAzFZH4GiTo0v", opaque="FQhe/qaU925kfnzjCev0ciny7QMkPqMAFRtzCUYo5tdS""#;
        let req = DigestRequest {
            username: "Mufasa",
            password: "Circle of Life",
            method: "GET",
            uri: "/dir/index.html",
            nc: 1,
            cnonce: "f2/wE4q74E6zIJEtWaHKaf5wv/H5QzzpXusqGemxURZJ",
        };

        let md5 = DigestChallenge::parse(&format!("Digest {}, algorithm=MD5", base)).unwrap();
        assert_eq!(md5.response(&req), "8ca523f5e9506fed4657c9700eebdbec");

        let sha = DigestChallenge::parse(&format!("Digest {}, algorithm=SHA-256", base)).unwrap();
        assert_eq!(
            sha.response(&req),
            "753927fa0e85d155564e2e272a28d1802ca10daf4496794697cf8db5856cb6c1"
        );
    }

    #[test]
    fn test_legacy_and_session_responses() {
        let req = DigestRequest {
            username: "maker",
            password: "pw",
            method: "GET",
            uri: "/api/v1/status",
            nc: 2,
            cnonce: "xyz",
        };

        let legacy = DigestChallenge::parse(r#"Digest realm="Printer API", nonce="abc""#).unwrap();
        assert_eq!(legacy.response(&req), "6aa7bc1420b407011b4df0b0e25b0a5d");

        let sess = DigestChallenge::parse(
            r#"Digest realm="Printer API", nonce="abc", qop="auth", algorithm=MD5-sess"#,
        )
        .unwrap();
        assert_eq!(sess.response(&req), "a8f10b654e9791f3b304de031b91e180");
    }

    #[test]
    fn test_authorization_header_fields() {
        let challenge = DigestChallenge::parse(
            r#"Digest realm="Printer API", nonce="abc", qop="auth", opaque="op""#,
        )
        .unwrap();
        let req = DigestRequest {
            username: "maker",
            password: "pw",
            method: "POST",
            uri: "/api/v1/print",
            nc: 10,
            cnonce: "c1",
        };
        let header = challenge.authorization(&req);
        assert!(header.starts_with("Digest "));
        assert!(header.contains(r#"username="maker""#));
        assert!(header.contains(r#"uri="/api/v1/print""#));
        assert!(header.contains(r#"opaque="op""#));
        assert!(header.contains("nc=0000000a"));
        assert!(header.contains(r#"cnonce="c1""#));
        assert!(header.contains(&format!(r#"response="{}""#, challenge.response(&req))));
    }
}
