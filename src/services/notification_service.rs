// src/services/notification_service.rs
//
// Fachada de despacho: um único ponto de envio de SMS/e-mail por cima dos
// provedores. A seleção do provedor acontece UMA vez, na inicialização, a
// partir da presença das credenciais no ambiente, nunca por chamada.
// A fachada não faz retry nem fallback SMS->e-mail: essa orquestração mora
// um nível acima, no QueueService.

use std::{env, sync::Arc, time::Duration};

use crate::{
    models::notification::DeliveryResult,
    services::providers::{
        NotificationProvider, POSTMARK_BASE_URL, PRELUDE_BASE_URL, PostmarkProvider,
        PreludeProvider, TWILIO_BASE_URL, TwilioProvider,
    },
    services::templates::EmailTemplate,
};

// Timeout curto: um provedor lento é tratado como falha de entrega, não
// como requisição pendurada.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

// Resultado da resolução de provedor de SMS na inicialização.
pub enum SmsSelection {
    None,
    Twilio(TwilioProvider),
    Prelude(PreludeProvider),
}

impl SmsSelection {
    /// Twilio é o provedor preferido e exige as duas credenciais; Prelude é o
    /// fallback com credencial única. Sem nenhum dos dois, SMS fica indisponível.
    pub fn resolve(
        twilio_account_sid: Option<String>,
        twilio_auth_token: Option<String>,
        twilio_phone_number: Option<String>,
        prelude_api_token: Option<String>,
    ) -> Self {
        if let (Some(account_sid), Some(auth_token)) = (twilio_account_sid, twilio_auth_token) {
            return SmsSelection::Twilio(TwilioProvider {
                account_sid,
                auth_token,
                from_number: twilio_phone_number,
                base_url: TWILIO_BASE_URL.to_string(),
            });
        }
        if let Some(api_token) = prelude_api_token {
            return SmsSelection::Prelude(PreludeProvider {
                api_token,
                base_url: PRELUDE_BASE_URL.to_string(),
            });
        }
        SmsSelection::None
    }

    pub fn name(&self) -> &'static str {
        match self {
            SmsSelection::None => "none",
            SmsSelection::Twilio(_) => "twilio",
            SmsSelection::Prelude(_) => "prelude",
        }
    }
}

#[derive(Clone)]
pub struct NotificationService {
    client: reqwest::Client,
    sms_provider: Option<Arc<dyn NotificationProvider>>,
    email_provider: Option<Arc<dyn NotificationProvider>>,
}

impl NotificationService {
    pub fn new(sms: SmsSelection, email: Option<PostmarkProvider>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .expect("Falha ao construir o cliente HTTP de notificações");

        let sms_provider: Option<Arc<dyn NotificationProvider>> = match sms {
            SmsSelection::None => None,
            SmsSelection::Twilio(provider) => Some(Arc::new(provider)),
            SmsSelection::Prelude(provider) => Some(Arc::new(provider)),
        };
        let email_provider: Option<Arc<dyn NotificationProvider>> =
            email.map(|provider| Arc::new(provider) as Arc<dyn NotificationProvider>);

        Self {
            client,
            sms_provider,
            email_provider,
        }
    }

    /// Resolve os provedores a partir do ambiente, uma única vez no startup.
    pub fn from_env() -> Self {
        let sms = SmsSelection::resolve(
            env::var("TWILIO_ACCOUNT_SID").ok(),
            env::var("TWILIO_AUTH_TOKEN").ok(),
            env::var("TWILIO_PHONE_NUMBER").ok(),
            env::var("PRELUDE_API_TOKEN").ok(),
        );
        tracing::info!("📱 Provedor de SMS selecionado: {}", sms.name());

        let email = match (
            env::var("POSTMARK_API_TOKEN").ok(),
            env::var("POSTMARK_FROM_EMAIL").ok(),
        ) {
            (Some(api_token), Some(from_email)) => {
                tracing::info!("📧 Provedor de e-mail selecionado: postmark");
                Some(PostmarkProvider {
                    api_token,
                    from_email,
                    base_url: POSTMARK_BASE_URL.to_string(),
                })
            }
            _ => {
                tracing::warn!("⚠️ Nenhum provedor de e-mail configurado");
                None
            }
        };

        Self::new(sms, email)
    }

    /// Envia um SMS com texto já renderizado. Sem provedor configurado,
    /// falha sem nenhuma chamada de rede.
    pub async fn send_sms(&self, to: &str, body: &str) -> DeliveryResult {
        let Some(provider) = &self.sms_provider else {
            return DeliveryResult::failed("no provider configured");
        };
        let phone = clean_phone_number(to);
        provider.send(&self.client, &phone, "", body, None).await
    }

    pub async fn send_email(&self, to: &str, template: &EmailTemplate) -> DeliveryResult {
        let Some(provider) = &self.email_provider else {
            return DeliveryResult::failed("no provider configured");
        };
        provider
            .send(
                &self.client,
                to,
                &template.subject,
                &template.text_body,
                Some(&template.html_body),
            )
            .await
    }
}

/// Normaliza o telefone para o formato E.164.
pub fn clean_phone_number(phone: &str) -> String {
    let cleaned: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if cleaned.starts_with('+') {
        return cleaned;
    }
    // Sem código de país: assume número dos EUA com 10 dígitos.
    if cleaned.len() == 10 {
        format!("+1{cleaned}")
    } else if cleaned.len() == 11 && cleaned.starts_with('1') {
        format!("+{cleaned}")
    } else {
        format!("+{cleaned}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twilio_preferido_quando_ambas_credenciais_presentes() {
        let selection = SmsSelection::resolve(
            Some("AC123".into()),
            Some("token".into()),
            None,
            Some("prelude-token".into()),
        );
        assert_eq!(selection.name(), "twilio");
    }

    #[test]
    fn twilio_incompleto_cai_para_prelude() {
        let selection =
            SmsSelection::resolve(Some("AC123".into()), None, None, Some("prelude-token".into()));
        assert_eq!(selection.name(), "prelude");
    }

    #[test]
    fn sem_credenciais_sms_fica_indisponivel() {
        let selection = SmsSelection::resolve(None, None, None, None);
        assert_eq!(selection.name(), "none");
    }

    #[tokio::test]
    async fn send_sms_sem_provedor_falha_sem_rede() {
        let service = NotificationService::new(SmsSelection::None, None);
        let result = service.send_sms("+5511999999999", "oi").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("no provider configured"));
    }

    #[tokio::test]
    async fn send_email_sem_provedor_falha_sem_rede() {
        let service = NotificationService::new(SmsSelection::None, None);
        let template = crate::services::templates::email_next_in_line("A", "B", "C");
        let result = service.send_email("a@b.com", &template).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("no provider configured"));
    }

    #[test]
    fn normalizacao_de_telefone() {
        assert_eq!(clean_phone_number("+55 11 99999-9999"), "+5511999999999");
        assert_eq!(clean_phone_number("(415) 555-2671"), "+14155552671");
        assert_eq!(clean_phone_number("14155552671"), "+14155552671");
        assert_eq!(clean_phone_number("+14155552671"), "+14155552671");
    }
}
