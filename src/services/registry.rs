// src/services/registry.rs

//! Busca no Enhetsregisteret (Brønnøysund) para o cadastro de clientes.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::{common::error::AppError, models::registry::CompanySuggestion};

const MAX_RESULTS: usize = 10;
const MIN_QUERY_LEN: usize = 2;

// --- Formato da resposta do registro ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryEntity {
    organisasjonsnummer: String,
    navn: String,
    forretningsadresse: Option<RegistryAddress>,
    postadresse: Option<RegistryAddress>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryAddress {
    #[serde(default)]
    adresse: Vec<String>,
    postnummer: Option<String>,
    poststed: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(rename = "_embedded")]
    embedded: Option<SearchEmbedded>,
}

#[derive(Debug, Deserialize)]
struct SearchEmbedded {
    #[serde(default)]
    enheter: Vec<RegistryEntity>,
}

impl From<RegistryEntity> for CompanySuggestion {
    fn from(entity: RegistryEntity) -> Self {
        let address = entity.forretningsadresse.or(entity.postadresse);
        let (street, postal_code, city) = match address {
            Some(a) => {
                let street = a.adresse.join(", ");
                ((!street.is_empty()).then_some(street), a.postnummer, a.poststed)
            }
            None => (None, None, None),
        };

        CompanySuggestion {
            org_number: entity.organisasjonsnummer,
            name: entity.navn,
            address: street,
            postal_code,
            city,
        }
    }
}

/// Tipo de consulta decidido pelo texto digitado.
#[derive(Debug, PartialEq, Eq)]
pub enum RegistryQuery {
    OrgNumber(String),
    Name(String),
}

impl RegistryQuery {
    /// Nove dígitos (espaços ignorados) viram consulta direta por número.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        let digits: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();

        if digits.len() == 9 && digits.chars().all(|c| c.is_ascii_digit()) {
            return Ok(RegistryQuery::OrgNumber(digits));
        }
        if trimmed.chars().count() < MIN_QUERY_LEN {
            return Err(AppError::InvalidInput("query".into()));
        }
        Ok(RegistryQuery::Name(trimmed.to_string()))
    }
}

#[derive(Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub async fn search(&self, raw_query: &str) -> Result<Vec<CompanySuggestion>, AppError> {
        match RegistryQuery::parse(raw_query)? {
            RegistryQuery::OrgNumber(number) => self.lookup(&number).await,
            RegistryQuery::Name(name) => self.search_by_name(&name).await,
        }
    }

    async fn lookup(&self, org_number: &str) -> Result<Vec<CompanySuggestion>, AppError> {
        let response = self
            .client
            .get(format!("{}/enheter/{}", self.base_url, org_number))
            .send()
            .await?;

        // Número inexistente (ou removido) não é erro para quem busca
        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            return Ok(vec![]);
        }

        let entity: RegistryEntity = response.error_for_status()?.json().await?;
        Ok(vec![entity.into()])
    }

    async fn search_by_name(&self, name: &str) -> Result<Vec<CompanySuggestion>, AppError> {
        let size = MAX_RESULTS.to_string();
        let page: SearchPage = self
            .client
            .get(format!("{}/enheter", self.base_url))
            .query(&[("navn", name), ("size", size.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(suggestions_from_page(page))
    }
}

fn suggestions_from_page(page: SearchPage) -> Vec<CompanySuggestion> {
    page.embedded
        .map(|e| e.enheter)
        .unwrap_or_default()
        .into_iter()
        .take(MAX_RESULTS)
        .map(CompanySuggestion::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nine_digits_is_an_org_number_lookup() {
        assert_eq!(
            RegistryQuery::parse(" 987 654 321 ").unwrap(),
            RegistryQuery::OrgNumber("987654321".into())
        );
        assert_eq!(
            RegistryQuery::parse("Brann AS").unwrap(),
            RegistryQuery::Name("Brann AS".into())
        );
        // Oito dígitos é busca por nome
        assert!(matches!(RegistryQuery::parse("98765432").unwrap(), RegistryQuery::Name(_)));
        assert!(RegistryQuery::parse("a").is_err());
    }

    #[test]
    fn search_page_is_mapped() {
        let page: SearchPage = serde_json::from_value(json!({
            "_embedded": {"enheter": [{
                "organisasjonsnummer": "987654321",
                "navn": "BRANNVERN AS",
                "forretningsadresse": {
                    "adresse": ["Storgata 1", "2. etasje"],
                    "postnummer": "0155",
                    "poststed": "OSLO"
                }
            }]},
            "page": {"size": 10, "totalElements": 1}
        }))
        .unwrap();

        let suggestions = suggestions_from_page(page);
        assert_eq!(
            suggestions,
            vec![CompanySuggestion {
                org_number: "987654321".into(),
                name: "BRANNVERN AS".into(),
                address: Some("Storgata 1, 2. etasje".into()),
                postal_code: Some("0155".into()),
                city: Some("OSLO".into()),
            }]
        );
    }

    #[test]
    fn empty_search_has_no_embedded_block() {
        let page: SearchPage = serde_json::from_value(json!({"page": {"totalElements": 0}})).unwrap();
        assert!(suggestions_from_page(page).is_empty());
    }

    #[test]
    fn postal_address_is_the_fallback() {
        let entity: RegistryEntity = serde_json::from_value(json!({
            "organisasjonsnummer": "912345678",
            "navn": "FORENING",
            "postadresse": {"adresse": [], "postnummer": "5003", "poststed": "BERGEN"}
        }))
        .unwrap();

        let suggestion = CompanySuggestion::from(entity);
        assert_eq!(suggestion.address, None);
        assert_eq!(suggestion.city.as_deref(), Some("BERGEN"));
    }
}
