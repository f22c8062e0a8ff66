// src/services/providers.rs
//
// Provedores de notificação. Cada um fala com a API do fornecedor e converte
// qualquer falha (HTTP, rede, timeout) em DeliveryResult, nunca em erro
// propagado. Os provedores recebem texto já renderizado e um destino.

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::notification::DeliveryResult;

pub const TWILIO_BASE_URL: &str = "https://api.twilio.com";
pub const PRELUDE_BASE_URL: &str = "https://api.prelude.dev/v2";
pub const POSTMARK_BASE_URL: &str = "https://api.postmarkapp.com";

#[async_trait]
pub trait NotificationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(
        &self,
        client: &reqwest::Client,
        to: &str,
        subject: &str,
        body: &str,
        html_body: Option<&str>,
    ) -> DeliveryResult;
}

// Classifica erros do reqwest em uma razão curta para o DeliveryResult.
fn classify_request_error(provider: &str, err: reqwest::Error) -> DeliveryResult {
    let reason = if err.is_timeout() {
        format!("{provider}: timeout")
    } else if err.is_connect() {
        format!("{provider}: connection error")
    } else {
        format!("{provider}: request error: {err}")
    };
    DeliveryResult::failed(reason)
}

// ---
// Twilio (SMS primário)
// ---

#[derive(Debug, Clone)]
pub struct TwilioProvider {
    pub account_sid: String,
    pub auth_token: String,
    // Pode estar ausente mesmo com o provedor configurado: nesse caso o
    // envio falha sem chamada de rede.
    pub from_number: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
struct TwilioResponse {
    sid: Option<String>,
    message: Option<String>,
}

#[async_trait]
impl NotificationProvider for TwilioProvider {
    fn name(&self) -> &'static str {
        "twilio"
    }

    async fn send(
        &self,
        client: &reqwest::Client,
        to: &str,
        _subject: &str,
        body: &str,
        _html_body: Option<&str>,
    ) -> DeliveryResult {
        let Some(from_number) = &self.from_number else {
            return DeliveryResult::failed("twilio: phone number is required for sending SMS");
        };

        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        let params = [("To", to), ("From", from_number.as_str()), ("Body", body)];

        let response = match client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_request_error("twilio", e),
        };

        let status = response.status();
        let parsed: TwilioResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => return classify_request_error("twilio", e),
        };

        if status.is_success() {
            DeliveryResult::sent(parsed.sid)
        } else {
            DeliveryResult::failed(format!(
                "twilio: {}",
                parsed.message.unwrap_or_else(|| "Unknown error".to_string())
            ))
        }
    }
}

// ---
// Prelude (SMS secundário, credencial única)
// ---

#[derive(Debug, Clone)]
pub struct PreludeProvider {
    pub api_token: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
struct PreludeError {
    message: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PreludeResponse {
    id: Option<String>,
    message_id: Option<String>,
    error: Option<PreludeError>,
}

#[async_trait]
impl NotificationProvider for PreludeProvider {
    fn name(&self) -> &'static str {
        "prelude"
    }

    async fn send(
        &self,
        client: &reqwest::Client,
        to: &str,
        _subject: &str,
        body: &str,
        _html_body: Option<&str>,
    ) -> DeliveryResult {
        let url = format!("{}/transactional", self.base_url);
        let payload = serde_json::json!({ "to": to, "message": body });

        let response = match client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_request_error("prelude", e),
        };

        let status = response.status();
        let parsed: PreludeResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => return classify_request_error("prelude", e),
        };

        if status.is_success() {
            DeliveryResult::sent(parsed.id.or(parsed.message_id))
        } else {
            let error = parsed.error.unwrap_or(PreludeError {
                message: None,
                code: None,
            });
            let mut reason = format!(
                "prelude: {}",
                error.message.unwrap_or_else(|| "Unknown error".to_string())
            );
            if let Some(code) = error.code {
                reason.push_str(&format!(" (code: {code})"));
            }
            DeliveryResult::failed(reason)
        }
    }
}

// ---
// Postmark (e-mail)
// ---

#[derive(Debug, Clone)]
pub struct PostmarkProvider {
    pub api_token: String,
    pub from_email: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
struct PostmarkResponse {
    #[serde(rename = "MessageID")]
    message_id: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
}

#[async_trait]
impl NotificationProvider for PostmarkProvider {
    fn name(&self) -> &'static str {
        "postmark"
    }

    async fn send(
        &self,
        client: &reqwest::Client,
        to: &str,
        subject: &str,
        body: &str,
        html_body: Option<&str>,
    ) -> DeliveryResult {
        let url = format!("{}/email", self.base_url);
        let mut payload = serde_json::json!({
            "From": self.from_email,
            "To": to,
            "Subject": subject,
            "TextBody": body,
        });
        if let Some(html) = html_body {
            payload["HtmlBody"] = serde_json::Value::String(html.to_string());
        }

        let response = match client
            .post(&url)
            .header("X-Postmark-Server-Token", &self.api_token)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_request_error("postmark", e),
        };

        let status = response.status();
        let parsed: PostmarkResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => return classify_request_error("postmark", e),
        };

        if status.is_success() {
            DeliveryResult::sent(parsed.message_id)
        } else {
            DeliveryResult::failed(format!(
                "postmark: {}",
                parsed.message.unwrap_or_else(|| "Unknown error".to_string())
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap()
    }

    fn twilio(base_url: String) -> TwilioProvider {
        TwilioProvider {
            account_sid: "AC123".into(),
            auth_token: "secret".into(),
            from_number: Some("+15550000000".into()),
            base_url,
        }
    }

    #[tokio::test]
    async fn twilio_envia_e_retorna_sid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
            .and(body_string_contains("To=%2B15551234567"))
            .and(body_string_contains("Body=ola"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({ "sid": "SM42" })),
            )
            .mount(&server)
            .await;

        let provider = twilio(server.uri());
        let result = provider.send(&client(), "+15551234567", "", "ola", None).await;

        assert!(result.success);
        assert_eq!(result.message_id.as_deref(), Some("SM42"));
    }

    #[tokio::test]
    async fn twilio_sem_numero_de_origem_falha_sem_rede() {
        let provider = TwilioProvider {
            account_sid: "AC123".into(),
            auth_token: "secret".into(),
            from_number: None,
            base_url: "http://127.0.0.1:1".into(),
        };
        let result = provider.send(&client(), "+15551234567", "", "ola", None).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("phone number"));
    }

    #[tokio::test]
    async fn twilio_propaga_mensagem_de_erro_da_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                serde_json::json!({ "message": "The 'To' number is not valid" }),
            ))
            .mount(&server)
            .await;

        let provider = twilio(server.uri());
        let result = provider.send(&client(), "banana", "", "ola", None).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("not valid"));
    }

    #[tokio::test]
    async fn prelude_envia_com_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transactional"))
            .and(header("Authorization", "Bearer tok-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "msg-7" })),
            )
            .mount(&server)
            .await;

        let provider = PreludeProvider {
            api_token: "tok-1".into(),
            base_url: server.uri(),
        };
        let result = provider.send(&client(), "+15551234567", "", "ola", None).await;

        assert!(result.success);
        assert_eq!(result.message_id.as_deref(), Some("msg-7"));
    }

    #[tokio::test]
    async fn prelude_inclui_codigo_de_erro_na_razao() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "error": { "message": "invalid phone", "code": "E1001" }
            })))
            .mount(&server)
            .await;

        let provider = PreludeProvider {
            api_token: "tok-1".into(),
            base_url: server.uri(),
        };
        let result = provider.send(&client(), "banana", "", "ola", None).await;

        assert!(!result.success);
        let reason = result.error.unwrap();
        assert!(reason.contains("invalid phone"));
        assert!(reason.contains("E1001"));
    }

    #[tokio::test]
    async fn postmark_envia_com_token_no_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/email"))
            .and(header("X-Postmark-Server-Token", "pm-1"))
            .and(body_string_contains("HtmlBody"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "MessageID": "pm-msg-3" })),
            )
            .mount(&server)
            .await;

        let provider = PostmarkProvider {
            api_token: "pm-1".into(),
            from_email: "fila@example.com".into(),
            base_url: server.uri(),
        };
        let result = provider
            .send(
                &client(),
                "cliente@example.com",
                "Bem-vindo",
                "texto",
                Some("<p>html</p>"),
            )
            .await;

        assert!(result.success);
        assert_eq!(result.message_id.as_deref(), Some("pm-msg-3"));
    }

    #[tokio::test]
    async fn postmark_propaga_mensagem_de_erro() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_json(
                serde_json::json!({ "ErrorCode": 300, "Message": "Invalid 'To' address" }),
            ))
            .mount(&server)
            .await;

        let provider = PostmarkProvider {
            api_token: "pm-1".into(),
            from_email: "fila@example.com".into(),
            base_url: server.uri(),
        };
        let result = provider.send(&client(), "banana", "Oi", "texto", None).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Invalid 'To' address"));
    }

    #[tokio::test]
    async fn timeout_vira_falha_classificada() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "late" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let provider = PreludeProvider {
            api_token: "tok-1".into(),
            base_url: server.uri(),
        };
        let result = provider.send(&client(), "+15551234567", "", "ola", None).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("timeout"));
    }
}
