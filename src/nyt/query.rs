//! Article search request URLs

use url::Url;

use crate::models::FilterField;
use crate::nyt::{CollectError, NytApi};

/// One article search request before the credential is attached
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub tags: &'a [String],
    pub filters: &'a [FilterField],
    pub begin_date: &'a str,
    pub end_date: &'a str,
    pub page: u32,
}

impl SearchRequest<'_> {
    /// The `fq` filter query: `field:("t1" OR "t2")` per filter field,
    /// joined with ` OR `.
    ///
    /// Tags are quoted but not escaped, so they must not contain `"`.
    /// Nothing checks the length of the resulting query; the provider
    /// rejects very long ones.
    pub fn filter_query(&self) -> String {
        let quoted: Vec<String> = self.tags.iter().map(|t| format!("\"{}\"", t)).collect();
        let tag_clause = quoted.join(" OR ");

        self.filters
            .iter()
            .map(|field| format!("{}:({})", field.as_str(), tag_clause))
            .collect::<Vec<_>>()
            .join(" OR ")
    }

    /// Full request URL against `base_url`
    pub fn to_url(&self, base_url: &str, api_key: &str) -> Result<Url, CollectError> {
        let mut url = Url::parse(base_url)?.join(NytApi::ARTICLE_SEARCH_ENDPOINT)?;
        url.query_pairs_mut()
            .append_pair("fq", &self.filter_query())
            .append_pair("begin_date", self.begin_date)
            .append_pair("end_date", self.end_date)
            .append_pair("page", &self.page.to_string())
            .append_pair("api-key", api_key);
        Ok(url)
    }
}

/// URL with the API key masked, for logging
pub fn redact(url: &Url) -> String {
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == "api-key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), value)
        })
        .collect();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}
