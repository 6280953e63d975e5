use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Taobao,
    Tmall,
    Jd,
    Pdd,
    Other,
}

// Checked in order; first fragment found in the host wins.
const HOST_FRAGMENTS: &[(&str, Platform)] = &[
    ("taobao.com", Platform::Taobao),
    ("tmall.com", Platform::Tmall),
    ("jd.com", Platform::Jd),
    ("pdd", Platform::Pdd),
    ("yangkeduo", Platform::Pdd),
];

impl Platform {
    /// Detect the site family from a raw URL. Never fails: unknown hosts map to `Other`.
    pub fn detect(raw_url: &str) -> Platform {
        let haystack = Url::parse(raw_url.trim())
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
            .unwrap_or_else(|| raw_url.to_ascii_lowercase());

        HOST_FRAGMENTS
            .iter()
            .find(|(frag, _)| haystack.contains(frag))
            .map(|(_, p)| *p)
            .unwrap_or(Platform::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Taobao => "taobao",
            Platform::Tmall => "tmall",
            Platform::Jd => "jd",
            Platform::Pdd => "pdd",
            Platform::Other => "other",
        }
    }

}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_hosts() {
        assert_eq!(Platform::detect("https://item.jd.com/100012043978.html"), Platform::Jd);
        assert_eq!(Platform::detect("https://m.pdd.com/goods.html?id=1"), Platform::Pdd);
        assert_eq!(Platform::detect("https://mobile.yangkeduo.com/goods.html"), Platform::Pdd);
        assert_eq!(Platform::detect("https://item.taobao.com/item.htm?id=42"), Platform::Taobao);
        assert_eq!(Platform::detect("https://detail.tmall.com/item.htm?id=42"), Platform::Tmall);
    }

    #[test]
    fn unknown_host_is_other() {
        assert_eq!(Platform::detect("https://www.example.com/shop/pdd-guide"), Platform::Other);
        assert_eq!(Platform::detect(""), Platform::Other);
    }

    #[test]
    fn unparseable_url_falls_back_to_raw_text() {
        assert_eq!(Platform::detect("item.JD.com/1.html"), Platform::Jd);
    }

    #[test]
    fn cli_names_match_as_str() {
        for p in Platform::value_variants() {
            assert_eq!(Platform::from_str(p.as_str(), false), Ok(*p));
        }
        assert_eq!(Platform::from_str("JD", true), Ok(Platform::Jd));
        assert!(Platform::from_str("jingdong", true).is_err());
    }
}
