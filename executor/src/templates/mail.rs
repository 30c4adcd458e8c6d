//! AppleScript templates for Apple Mail.

use serde_json::Map;
use serde_json::Value;

use super::required_str;
use super::str_param;
use crate::ExecutorError;
use crate::json_escape::esc;

pub(super) fn build(
    template_id: &str,
    bundle_id: &str,
    parameters: &Map<String, Value>,
) -> Result<String, ExecutorError> {
    match template_id {
        "mail.list_mailboxes" => Ok(list_mailboxes(bundle_id)),
        "mail.compose_draft" => compose_draft(bundle_id, parameters),
        _ => Err(ExecutorError::InvalidRequest(format!(
            "Unknown mail template: {template_id}"
        ))),
    }
}

fn list_mailboxes(bundle_id: &str) -> String {
    format!(
        r#"tell application id "{bundle_id}"
    set mboxList to {{}}
    repeat with acct in accounts
        repeat with mbox in mailboxes of acct
            set end of mboxList to {{mboxName:name of mbox, acctName:name of acct, msgCount:count of messages of mbox}}
        end repeat
    end repeat
    set output to "["
    repeat with i from 1 to count of mboxList
        set m to item i of mboxList
        set output to output & "{{\"id\":\"" & my jsonEsc(acctName of m) & "/" & my jsonEsc(mboxName of m) & "\",\"name\":\"" & my jsonEsc(mboxName of m) & "\",\"type\":\"mailbox\",\"itemCount\":" & (msgCount of m as text) & "}}"
        if i < (count of mboxList) then set output to output & ","
    end repeat
    set output to output & "]"
    return output
end tell"#
    )
}

fn compose_draft(
    bundle_id: &str,
    parameters: &Map<String, Value>,
) -> Result<String, ExecutorError> {
    let to = esc(required_str(parameters, "to", "mail.compose_draft")?);
    let subject = esc(str_param(parameters, "subject").unwrap_or(""));
    let body = esc(str_param(parameters, "body").unwrap_or(""));

    Ok(format!(
        r#"tell application id "{bundle_id}"
    set newMessage to make new outgoing message with properties {{subject:"{subject}", content:"{body}", visible:true}}
    tell newMessage
        make new to recipient at end of to recipients with properties {{address:"{to}"}}
    end tell
    return "{{\"id\":\"draft\",\"name\":\"" & my jsonEsc(subject of newMessage) & "\",\"type\":\"message\"}}"
end tell"#
    ))
}
