//! Simulated message delivery (email, SMS, notification).
//!
//! Nothing is sent; the tool waits a moment and returns a receipt so the
//! agent flow behaves as if a gateway had accepted the message.

use async_trait::async_trait;
use agentloom_core::error::ToolError;
use agentloom_core::tool::{ParamType, Tool, ToolParameter};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::required_str;

const DEFAULT_DELAY: Duration = Duration::from_millis(500);

pub struct SendMessageTool {
    delay: Duration,
}

impl SendMessageTool {
    pub fn new() -> Self {
        Self {
            delay: DEFAULT_DELAY,
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SendMessageTool {
    fn default() -> Self {
        Self::new()
    }
}

/// `msg_<unix millis>_<9 random alphanumerics>`
fn message_id() -> String {
    let suffix: String = uuid::Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("msg_{}_{}", Utc::now().timestamp_millis(), suffix)
}

#[async_trait]
impl Tool for SendMessageTool {
    fn name(&self) -> &str {
        "send_message"
    }

    fn description(&self) -> &str {
        "Envia email, SMS ou notificação para um cliente. Use quando precisar avisar algo. Exemplo: type=\"email\", recipient=\"cliente@email.com\", subject=\"Pedido confirmado\", body=\"Seu pedido foi processado\""
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![
            ToolParameter::required(
                "type",
                ParamType::String,
                "Escolha UMA opção: \"email\" OU \"sms\" OU \"notification\"",
            ),
            ToolParameter::required(
                "recipient",
                ParamType::String,
                "Email (exemplo: cliente@email.com) OU telefone (exemplo: +5511999999999)",
            ),
            ToolParameter::optional(
                "subject",
                ParamType::String,
                "Título do email (apenas para type=\"email\")",
            ),
            ToolParameter::required("body", ParamType::String, "Texto da mensagem"),
        ]
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let kind = required_str(&arguments, "type")?;
        let recipient = required_str(&arguments, "recipient")?;
        required_str(&arguments, "body")?;

        tokio::time::sleep(self.delay).await;

        let mut receipt = serde_json::json!({
            "success": true,
            "messageId": message_id(),
            "type": kind,
            "recipient": recipient,
            "sentAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "status": "sent",
            "message": format!("{kind} sent to {recipient}"),
        });
        if let Some(subject) = arguments.get("subject").filter(|s| !s.is_null()) {
            receipt["subject"] = subject.clone();
        }
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn returns_receipt() {
        let tool = SendMessageTool::with_delay(Duration::ZERO);
        let result = tool
            .execute(args(json!({
                "type": "email",
                "recipient": "cliente@email.com",
                "subject": "Pedido confirmado",
                "body": "Seu pedido foi processado",
            })))
            .await
            .unwrap();

        assert_eq!(result["success"], true);
        assert_eq!(result["status"], "sent");
        assert_eq!(result["subject"], "Pedido confirmado");
        assert_eq!(result["message"], "email sent to cliente@email.com");
        assert!(result["messageId"].as_str().unwrap().starts_with("msg_"));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_before_delivering() {
        let tool = SendMessageTool::new();
        let started = tokio::time::Instant::now();
        tool.execute(args(json!({"type": "sms", "recipient": "+5511999999999", "body": "Oi"})))
            .await
            .unwrap();
        assert!(started.elapsed() >= DEFAULT_DELAY);
    }

    #[tokio::test]
    async fn subject_is_optional_body_is_not() {
        let tool = SendMessageTool::with_delay(Duration::ZERO);
        let result = tool
            .execute(args(json!({"type": "sms", "recipient": "+55", "body": "Oi"})))
            .await
            .unwrap();
        assert!(result.get("subject").is_none());

        let err = tool
            .execute(args(json!({"type": "sms", "recipient": "+55"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn message_ids_have_expected_shape() {
        let id = message_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "msg");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
    }
}
