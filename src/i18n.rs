//! Locale message bundles.
//!
//! Bundles are embedded JSON files parsed once at startup into a [`Catalog`].
//! Requests pick a bundle from `Accept-Language`, falling back to the
//! configured default locale.

use std::{collections::HashMap, sync::Arc};

use anyhow::Context;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::ACCEPT_LANGUAGE, request::Parts, HeaderMap},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const BUNDLES: &[(&str, &str)] = &[
    ("en", include_str!("../messages/en.json")),
    ("fr", include_str!("../messages/fr.json")),
];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthMessages {
    pub registered: String,
    pub logged_in: String,
    pub logged_out: String,
    pub invalid_request: String,
    pub email_in_use: String,
    pub username_in_use: String,
    pub invalid_credentials: String,
    pub unauthorized: String,
    pub invalid_token: String,
    pub user_not_found: String,
    pub internal_error: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileMessages {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Messages {
    pub auth: AuthMessages,
    pub profile: ProfileMessages,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum I18nError {
    #[error("locale not found: {0}")]
    LocaleNotFound(String),
}

/// Locale code -> message bundle.
#[derive(Debug)]
pub struct Catalog {
    bundles: HashMap<String, Arc<Messages>>,
    default_locale: String,
}

impl Catalog {
    /// Parses every embedded bundle with `en` as the default locale.
    pub fn load() -> anyhow::Result<Self> {
        let mut bundles = HashMap::new();
        for (code, raw) in BUNDLES {
            let messages: Messages = serde_json::from_str(raw)
                .with_context(|| format!("parse message bundle {code}"))?;
            bundles.insert(code.to_string(), Arc::new(messages));
        }
        Ok(Self {
            bundles,
            default_locale: "en".into(),
        })
    }

    pub fn with_default_locale(mut self, code: &str) -> Result<Self, I18nError> {
        self.get(code)?;
        self.default_locale = code.to_string();
        Ok(self)
    }

    pub fn get(&self, code: &str) -> Result<Arc<Messages>, I18nError> {
        self.bundles
            .get(code)
            .cloned()
            .ok_or_else(|| I18nError::LocaleNotFound(code.to_string()))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.bundles.contains_key(code)
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn default_messages(&self) -> Arc<Messages> {
        // default_locale is only ever set to a key present in `bundles`
        self.bundles[&self.default_locale].clone()
    }

    /// Picks the first supported language from `Accept-Language`.
    pub fn negotiate(&self, headers: &HeaderMap) -> String {
        let header = headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        for entry in header.split(',') {
            let tag = entry.split(';').next().unwrap_or("").trim();
            let primary = tag.split('-').next().unwrap_or("").to_ascii_lowercase();
            if primary.is_empty() {
                continue;
            }
            match self.get(&primary) {
                Ok(_) => return primary,
                Err(e) => debug!(error = %e, "skipping unsupported language"),
            }
        }
        self.default_locale.clone()
    }

    pub fn resolve(&self, headers: &HeaderMap) -> Arc<Messages> {
        let code = self.negotiate(headers);
        self.get(&code).unwrap_or_else(|_| self.default_messages())
    }
}

/// The message bundle chosen for the current request.
pub struct Localized(pub Arc<Messages>);

#[async_trait]
impl<S> FromRequestParts<S> for Localized
where
    S: Send + Sync,
    Arc<Catalog>: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let catalog = Arc::<Catalog>::from_ref(state);
        Ok(Localized(catalog.resolve(&parts.headers)))
    }
}
