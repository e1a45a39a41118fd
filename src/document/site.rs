//! Site codes (`<iso>_<domain>`).
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;

/// One crawled domain, identified by an ISO 639-3 language code and a domain label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteCode {
    iso: String,
    domain: String,
}

impl SiteCode {
    pub fn new(iso: &str, domain: &str) -> Self {
        Self {
            iso: iso.to_string(),
            domain: domain.to_string(),
        }
    }

    /// Derive the domain label from an url: `https://www.voaswahili.com/a/x.html` gives `voaswahili`.
    ///
    /// The top level domain is dropped, remaining dots become underscores.
    pub fn domain_from_url(url: &str) -> Result<String, Error> {
        let url = Url::parse(url)?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::Custom(format!("no host in url {url}")))?;
        let host = host.strip_prefix("www.").unwrap_or(host);
        let labels: Vec<&str> = host.split('.').collect();
        let labels = match labels.len() {
            1 => &labels[..],
            n => &labels[..n - 1],
        };
        Ok(labels.join("_"))
    }

    /// Get a reference to the site's language code.
    pub fn iso(&self) -> &str {
        &self.iso
    }

    /// Get a reference to the site's domain label.
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for SiteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.iso, self.domain)
    }
}

impl FromStr for SiteCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('_') {
            Some((iso, domain)) if !iso.is_empty() && !domain.is_empty() => {
                Ok(SiteCode::new(iso, domain))
            }
            _ => Err(Error::Custom(format!("invalid site code {s:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SiteCode;

    #[test]
    fn domain_from_url() {
        assert_eq!(
            SiteCode::domain_from_url("https://www.voaswahili.com/a/habari/123.html").unwrap(),
            "voaswahili"
        );
        assert_eq!(
            SiteCode::domain_from_url("https://learningenglish.voanews.com/a/1.html").unwrap(),
            "learningenglish_voanews"
        );
        assert!(SiteCode::domain_from_url("not an url").is_err());
    }

    #[test]
    fn display_and_parse() {
        let site: SiteCode = "swh_voaswahili".parse().unwrap();
        assert_eq!(site.iso(), "swh");
        assert_eq!(site.domain(), "voaswahili");
        assert_eq!(site.to_string(), "swh_voaswahili");

        let site: SiteCode = "eng_learningenglish_voanews".parse().unwrap();
        assert_eq!(site.domain(), "learningenglish_voanews");
        assert!("nodomain".parse::<SiteCode>().is_err());
    }
}
