use regex::Regex;
use std::{error::Error as StdError, fmt, str::FromStr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// One outbound proxy, parsed from `host:port` or `host:port:user:pass`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: u16,
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyParseError {
    line: String,
}
impl fmt::Display for ProxyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, r#"Malformed proxy line "{}""#, self.line)
    }
}
impl StdError for ProxyParseError {}

fn line_regex() -> Regex {
    Regex::new(r"^([^:\s]+):([[:digit:]]{1,5})(?::([^:\s]+):(\S+))?$").unwrap()
}

impl ProxyEndpoint {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
    fn parse_with(line: &str, regex: &Regex) -> Result<Self, ProxyParseError> {
        let error = || ProxyParseError {
            line: line.to_string(),
        };
        let caps = regex.captures(line).ok_or_else(error)?;
        let port = caps[2].parse::<u16>().map_err(|_| error())?;
        if port == 0 {
            return Err(error());
        }
        Ok(Self {
            host: caps[1].to_string(),
            port,
            credentials: match (caps.get(3), caps.get(4)) {
                (Some(user), Some(password)) => Some(Credentials {
                    user: user.as_str().to_string(),
                    password: password.as_str().to_string(),
                }),
                _ => None,
            },
        })
    }
}
impl FromStr for ProxyEndpoint {
    type Err = ProxyParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with(s.trim(), &line_regex())
    }
}
impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Parses a proxy list, one endpoint per line. Blank lines are ignored; bad
/// lines come back as errors next to the good ones.
pub fn parse_list(text: &str) -> Vec<Result<ProxyEndpoint, ProxyParseError>> {
    let regex = line_regex();
    text.lines()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| ProxyEndpoint::parse_with(v, &regex))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_authenticated_lines() {
        let plain: ProxyEndpoint = "10.0.0.1:8080".parse().unwrap();
        assert_eq!(plain.host, "10.0.0.1");
        assert_eq!(plain.port, 8080);
        assert_eq!(plain.credentials, None);
        assert_eq!(plain.url(), "http://10.0.0.1:8080");

        let auth: ProxyEndpoint = "proxy.example.net:3128:bot:s3cret".parse().unwrap();
        assert_eq!(
            auth.credentials,
            Some(Credentials {
                user: "bot".to_string(),
                password: "s3cret".to_string()
            })
        );
    }

    #[test]
    fn malformed_lines_are_rejected() {
        for line in [
            "10.0.0.1",
            "10.0.0.1:http",
            "10.0.0.1:99999",
            "10.0.0.1:0",
            "10.0.0.1:80:onlyuser",
            "a b:80",
        ] {
            assert!(line.parse::<ProxyEndpoint>().is_err(), "{}", line);
        }
    }

    #[test]
    fn list_skips_blank_lines() {
        let parsed = parse_list("1.1.1.1:80\n\n  \nbroken\r\n2.2.2.2:81:u:p\n");
        assert_eq!(parsed.len(), 3);
        assert!(parsed[0].is_ok());
        assert!(parsed[1].is_err());
        assert!(parsed[2].is_ok());
    }
}
