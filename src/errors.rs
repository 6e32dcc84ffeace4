#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("Cookie domain attribute does not match the request host")]
    IllegalDomain,

    #[error("Malformed cookie domain attribute")]
    MalformedDomain,

    #[error("Unparseable cookie date: {0:?}")]
    DateParse(String),

    #[error("Invalid origin URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Cookie data matches no known schema: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Cannot encode cookies: {0}")]
    Encode(#[source] serde_json::Error),
}
