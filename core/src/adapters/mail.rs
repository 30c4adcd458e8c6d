//! Apple Mail adapter. Creating an item means composing a draft.

use super::AdapterError;
use super::AdapterResult;
use super::AppInfo;
use super::CreateParams;
use super::RenderedCall;
use super::ResourceAdapter;
use super::string_prop;

const INFO: AppInfo = AppInfo {
    name: "mail",
    display_name: "Apple Mail",
    bundle_id: "com.apple.mail",
};

#[derive(Default)]
pub struct MailAdapter;

impl ResourceAdapter for MailAdapter {
    fn info(&self) -> &AppInfo {
        &INFO
    }

    fn list_containers(&self) -> AdapterResult {
        Ok(RenderedCall::new("mail.list_mailboxes"))
    }

    fn create(&self, params: CreateParams) -> AdapterResult {
        let to = string_prop(&params.properties, "to").ok_or_else(|| {
            AdapterError::InvalidParams(
                "mail.compose_draft requires a 'to' property".to_string(),
            )
        })?;
        Ok(RenderedCall::new("mail.compose_draft")
            .with_param("to", to)
            .with_param(
                "subject",
                string_prop(&params.properties, "subject").unwrap_or_default(),
            )
            .with_param(
                "body",
                string_prop(&params.properties, "body").unwrap_or_default(),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn compose_draft_requires_a_recipient() {
        let adapter = MailAdapter;
        let err = adapter.create(CreateParams::default());
        assert!(matches!(err, Err(AdapterError::InvalidParams(_))));
    }

    #[test]
    fn compose_draft_defaults_subject_and_body() {
        let adapter = MailAdapter;
        let mut properties = serde_json::Map::new();
        properties.insert("to".to_string(), json!("ops@example.com"));
        let call = match adapter.create(CreateParams {
            container_id: None,
            properties,
        }) {
            Ok(call) => call,
            Err(e) => panic!("create failed: {e}"),
        };
        assert_eq!(call.template_id, "mail.compose_draft");
        assert_eq!(call.parameters.get("subject"), Some(&json!("")));
        assert_eq!(call.parameters.get("body"), Some(&json!("")));
    }
}
