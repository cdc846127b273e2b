// src/services/notification.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::{
    common::{
        codes::{random_code, MAGIC_CODE_LEN, TEMP_PASSWORD_LEN},
        error::AppError,
    },
    db::{InviteRepository, UserRepository},
    models::auth::User,
    services::auth::hash_password,
};

const MAGIC_LINK_TTL_MINUTES: i64 = 15;

/// Configuração do gateway de SMS (credenciais vão na query string).
#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub base_url: String,
    pub user: String,
    pub password: String,
    pub sender_id: String,
}

#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, to: &str, message: &str) -> Result<(), AppError>;
}

// ---
// Gateway HTTP: GET com credenciais, destinatário, mensagem e remetente
// ---
pub struct HttpSmsGateway {
    client: reqwest::Client,
    config: SmsConfig,
}

impl HttpSmsGateway {
    pub fn new(config: SmsConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        tracing::info!(sender = %config.sender_id, "Gateway de SMS configurado");
        Ok(Self { client, config })
    }

    fn query<'a>(&'a self, to: &'a str, message: &'a str) -> [(&'static str, &'a str); 6] {
        [
            ("user", self.config.user.as_str()),
            ("passwd", self.config.password.as_str()),
            ("to", to),
            ("msg", message),
            ("from", self.config.sender_id.as_str()),
            ("f", "json"),
        ]
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn send(&self, to: &str, message: &str) -> Result<(), AppError> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&self.query(to, message))
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        parse_gateway_response(&body)?;

        tracing::debug!(to = %to, "SMS enviado");
        Ok(())
    }
}

/// Sem credenciais configuradas o envio vira um no-op registado no log.
pub struct DisabledSmsGateway;

#[async_trait]
impl SmsGateway for DisabledSmsGateway {
    async fn send(&self, to: &str, _message: &str) -> Result<(), AppError> {
        tracing::info!(to = %to, "Gateway de SMS desativado; mensagem não enviada");
        Ok(())
    }
}

/// O gateway responde 200 mesmo em falha; o erro vem num campo do JSON.
pub fn parse_gateway_response(body: &Value) -> Result<(), AppError> {
    let response = body.get("response").unwrap_or(body);

    for field in ["fatalError", "error"] {
        if let Some(message) = response.get(field).and_then(Value::as_str) {
            if !message.trim().is_empty() {
                return Err(AppError::SmsGateway(message.to_string()));
            }
        }
    }

    if let Some(errors) = response.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let joined = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string())
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AppError::SmsGateway(joined));
        }
    }

    Ok(())
}

/// Normaliza telefones noruegueses: 8 dígitos ganham +47, "00" vira "+".
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed: String = raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();

    let (has_plus, digits) = match trimmed.strip_prefix('+') {
        Some(rest) => (true, rest.to_string()),
        None => match trimmed.strip_prefix("00") {
            Some(rest) => (true, rest.to_string()),
            None => (false, trimmed.clone()),
        },
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    match (has_plus, digits.len()) {
        (false, 8) => Some(format!("+47{}", digits)),
        (false, 10) if digits.starts_with("47") => Some(format!("+{}", digits)),
        (true, 8..=15) => Some(format!("+{}", digits)),
        _ => None,
    }
}

// ---
// Serviço de notificações: gera credenciais de acesso e envia o SMS.
// Falhas são registadas e engolidas; quem chamou nunca vê o erro.
// ---
#[derive(Clone)]
pub struct NotificationService {
    gateway: Arc<dyn SmsGateway>,
    user_repo: UserRepository,
    invite_repo: InviteRepository,
    portal_base_url: String,
}

impl NotificationService {
    pub fn new(
        gateway: Arc<dyn SmsGateway>,
        user_repo: UserRepository,
        invite_repo: InviteRepository,
        portal_base_url: String,
    ) -> Self {
        Self {
            gateway,
            user_repo,
            invite_repo,
            portal_base_url: portal_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// SMS de boas-vindas para um usuário recém-criado.
    pub async fn send_welcome(&self, user: &User, temp_password: &str) {
        let Some(phone) = user.phone.as_deref().and_then(normalize_phone) else {
            tracing::info!(user_id = %user.id, "Usuário sem telefone válido; boas-vindas não enviadas");
            return;
        };

        let message = welcome_message(&user.name, &self.portal_base_url, &phone, temp_password);
        if let Err(e) = self.gateway.send(&phone, &message).await {
            tracing::warn!(user_id = %user.id, error = %e, "Falha ao enviar SMS de boas-vindas");
        }
    }

    /// Aviso de curso atribuído. Nunca falha do ponto de vista de quem chama.
    pub async fn notify_course_assigned(&self, user: &User, course_title: &str) {
        if let Err(e) = self.try_notify_course_assigned(user, course_title).await {
            tracing::warn!(user_id = %user.id, error = %e, "Falha ao notificar atribuição de curso");
        }
    }

    async fn try_notify_course_assigned(&self, user: &User, course_title: &str) -> Result<(), AppError> {
        let Some(phone) = user.phone.as_deref().and_then(normalize_phone) else {
            tracing::info!(user_id = %user.id, "Usuário sem telefone válido; aviso não enviado");
            return Ok(());
        };

        // Quem nunca entrou recebe uma senha temporária; os outros, um código de login.
        let message = if user.last_login_at.is_none() {
            let temp_password = random_code(TEMP_PASSWORD_LEN);
            let hashed = hash_password(&temp_password).await?;
            self.user_repo.set_password(user.id, &hashed, true).await?;
            format!(
                "{} Du har fått tilgang til kurset «{}».",
                welcome_message(&user.name, &self.portal_base_url, &phone, &temp_password),
                course_title
            )
        } else {
            let code = random_code(MAGIC_CODE_LEN);
            let expires_at = Utc::now() + chrono::Duration::minutes(MAGIC_LINK_TTL_MINUTES);
            self.invite_repo.create_magic_link(&code, user.id, expires_at).await?;
            course_assigned_message(&user.name, course_title, &self.portal_base_url, &code)
        };

        self.gateway.send(&phone, &message).await
    }
}

fn welcome_message(name: &str, portal_url: &str, username: &str, temp_password: &str) -> String {
    format!(
        "Hei {}! Du har fått en bruker i IKontroll. Logg inn på {} med brukernavn {} og midlertidig passord {}.",
        name, portal_url, username, temp_password
    )
}

fn course_assigned_message(name: &str, course_title: &str, portal_url: &str, code: &str) -> String {
    format!(
        "Hei {}! Du har fått tilgang til kurset «{}». Logg inn her: {}/login/magic?code={}",
        name, course_title, portal_url, code
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn successful_response_is_accepted() {
        let body = json!({"response": {"msgOkCount": 1, "stdSMSCount": 1, "ids": [42]}});
        assert!(parse_gateway_response(&body).is_ok());
    }

    #[test]
    fn fatal_error_is_reported() {
        let body = json!({"response": {"fatalError": "Feil brukernavn/passord"}});
        let err = parse_gateway_response(&body).unwrap_err();
        assert!(matches!(err, AppError::SmsGateway(msg) if msg == "Feil brukernavn/passord"));
    }

    #[test]
    fn per_recipient_errors_are_joined() {
        let body = json!({"response": {"errors": [
            {"number": "123", "message": "Ugyldig nummer"},
            {"number": "456", "message": "Sperret"}
        ]}});
        let err = parse_gateway_response(&body).unwrap_err();
        assert!(matches!(err, AppError::SmsGateway(msg) if msg == "Ugyldig nummer; Sperret"));
    }

    #[test]
    fn flat_error_field_is_reported() {
        let body = json!({"error": "quota exceeded"});
        assert!(parse_gateway_response(&body).is_err());
        assert!(parse_gateway_response(&json!({"error": ""})).is_ok());
    }

    #[test]
    fn phones_are_normalized() {
        assert_eq!(normalize_phone("912 34 567").as_deref(), Some("+4791234567"));
        assert_eq!(normalize_phone("004791234567").as_deref(), Some("+4791234567"));
        assert_eq!(normalize_phone("+46 70 123 45 67").as_deref(), Some("+46701234567"));
        assert_eq!(normalize_phone("4791234567").as_deref(), Some("+4791234567"));
        assert_eq!(normalize_phone("1234"), None);
        assert_eq!(normalize_phone("abc"), None);
    }

    #[test]
    fn gateway_query_carries_credentials_and_sender() {
        let gateway = HttpSmsGateway::new(SmsConfig {
            base_url: "https://sms.example/SendMessage".into(),
            user: "ikontroll".into(),
            password: "hemmelig".into(),
            sender_id: "IKontroll".into(),
        })
        .unwrap();

        let query = gateway.query("+4791234567", "Hei");
        assert!(query.contains(&("user", "ikontroll")));
        assert!(query.contains(&("passwd", "hemmelig")));
        assert!(query.contains(&("to", "+4791234567")));
        assert!(query.contains(&("from", "IKontroll")));
        assert!(query.contains(&("f", "json")));
    }

    #[test]
    fn assignment_message_links_to_magic_login() {
        let msg = course_assigned_message("Kari", "Brannvern", "https://portal.ikontroll.no", "ABC123");
        assert!(msg.contains("«Brannvern»"));
        assert!(msg.ends_with("https://portal.ikontroll.no/login/magic?code=ABC123"));
    }
}
